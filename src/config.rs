//! Command-line configuration for the ingest binary.

use clap::Parser;
use std::path::PathBuf;

use crate::pipeline::IngestOptions;
use crate::text::Charset;

#[derive(Parser, Debug)]
#[command(name = "freedb-ingest")]
#[command(about = "Load a freedb/XMCD dump into a SQLite database")]
pub struct Args {
    /// Dump directory or tar(.bz2) archive
    pub dump: PathBuf,

    /// SQLite database to write (created if missing)
    #[arg(long)]
    pub db: PathBuf,

    /// How to decode dump bytes
    #[arg(long, value_enum, default_value_t = Charset::Detect)]
    pub charset: Charset,

    /// Delete the database before ingesting
    #[arg(long)]
    pub fresh: bool,

    /// Disable the spinner and log progress lines instead
    #[arg(long)]
    pub log_only: bool,

    /// Write run statistics as JSON
    #[arg(long)]
    pub stats_json: Option<PathBuf>,
}

impl Args {
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            charset: self.charset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["freedb-ingest", "dump.tar.bz2", "--db", "out.sqlite3"]).unwrap();
        assert_eq!(args.dump, PathBuf::from("dump.tar.bz2"));
        assert_eq!(args.db, PathBuf::from("out.sqlite3"));
        assert_eq!(args.charset, Charset::Detect);
        assert!(!args.fresh);
        assert!(!args.log_only);
        assert!(args.stats_json.is_none());
    }

    #[test]
    fn test_all_flags() {
        let args = Args::try_parse_from([
            "freedb-ingest",
            "freedb/",
            "--db",
            "out.db",
            "--charset",
            "utf8",
            "--fresh",
            "--log-only",
            "--stats-json",
            "stats.json",
        ])
        .unwrap();
        assert_eq!(args.ingest_options().charset, Charset::Utf8);
        assert!(args.fresh);
        assert!(args.log_only);
        assert_eq!(args.stats_json, Some(PathBuf::from("stats.json")));
    }

    #[test]
    fn test_db_required() {
        assert!(Args::try_parse_from(["freedb-ingest", "freedb/"]).is_err());
    }
}
