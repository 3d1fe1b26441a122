//! Print the parsed record of a single dump file as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use freedb_ingest::identity::resolve_shard;
use freedb_ingest::parser::{parse_dump, ParseOptions};
use freedb_ingest::text::Charset;

#[derive(Parser)]
#[command(name = "inspect-dump")]
#[command(about = "Parse one freedb dump file and print it as JSON")]
struct Args {
    file: PathBuf,

    /// Shard (genre directory) the file belongs to, e.g. "rock"
    #[arg(long)]
    shard: Option<String>,

    #[arg(long, value_enum, default_value_t = Charset::Detect)]
    charset: Charset,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let shard = args.shard.as_deref().map(resolve_shard).transpose()?;
    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;

    let record = parse_dump(
        BufReader::new(file),
        &ParseOptions {
            charset: args.charset,
            shard,
        },
    );

    println!("{}", serde_json::to_string_pretty(&record)?);
    if !record.is_usable() {
        eprintln!("warning: record has no usable checksum");
    }
    Ok(())
}
