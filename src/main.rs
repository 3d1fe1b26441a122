use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

use freedb_ingest::config::Args;
use freedb_ingest::pipeline::ingest;
use freedb_ingest::progress::{format_duration, set_log_only};
use freedb_ingest::safety::validate_database_path;
use freedb_ingest::sink::{configure_connection, init_schema};
use freedb_ingest::source::open_source;

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
    set_log_only(args.log_only);

    let start = Instant::now();

    validate_database_path(&args.db, &args.dump, args.fresh)?;
    if args.fresh && args.db.exists() {
        info!("Removing existing database {:?}", args.db);
        std::fs::remove_file(&args.db).context("Failed to remove existing database")?;
    }

    info!("Opening database {:?}", args.db);
    let mut conn = Connection::open(&args.db).context("Failed to open database")?;
    configure_connection(&conn)?;
    init_schema(&conn)?;

    let mut source = open_source(&args.dump)?;
    let stats = ingest(&mut conn, source.as_mut(), &args.ingest_options())?;

    let elapsed = start.elapsed();

    println!("\n{:=<60}", "");
    println!("Ingest complete!");
    println!("  Entries: {}", stats.entries_seen);
    println!("  Discs: {}", stats.discs_inserted);
    println!("  Tracks: {}", stats.tracks_inserted);
    println!(
        "  Skipped: {} ({} unusable, {} unknown shard)",
        stats.entries_skipped(),
        stats.entries_unusable,
        stats.entries_unknown_shard
    );
    println!("  Ignored: {}", stats.entries_ignored);
    println!("  Parse diagnostics: {}", stats.parse_diagnostics);
    println!("  Elapsed: {}", format_duration(elapsed));
    println!("{:=<60}", "");

    if let Some(path) = &args.stats_json {
        stats
            .write_to_file(path)
            .with_context(|| format!("Failed to write stats to {}", path.display()))?;
        info!("Wrote stats to {:?}", path);
    }

    Ok(())
}
