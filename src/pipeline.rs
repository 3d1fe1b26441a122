//! Batch ingestion of freedb dumps.
//!
//! Every entry of a source is parsed, keyed and inserted in order, inside a
//! single transaction. Bad dumps are skipped and logged; a failed insert
//! rolls back the whole batch.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::io::Read;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::identity::{compose_identity, resolve_shard, Checksum, Shard, UnknownShard};
use crate::models::IngestStats;
use crate::parser::{parse_dump, ParseOptions};
use crate::progress::{create_spinner, log_progress};
use crate::sink::{DiscSink, SqliteSink};
use crate::source::{DumpSource, EntryMeta};
use crate::text::Charset;

/// Files shipped alongside the dumps that are not dumps themselves.
pub const IGNORED_FILES: &[&str] = &["COPYING", "README"];

const PROGRESS_LOG_INTERVAL: u64 = 100_000;

#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    pub charset: Charset,
}

/// Run one batch inside a fresh transaction and commit it.
/// Any error rolls the transaction back before being returned.
pub fn ingest(
    conn: &mut Connection,
    source: &mut dyn DumpSource,
    opts: &IngestOptions,
) -> Result<IngestStats> {
    let tx = conn.transaction().context("Failed to begin transaction")?;

    let result = {
        let mut sink = SqliteSink::new(&tx);
        run_batch(source, &mut sink, opts)
    };

    match result {
        Ok(stats) => {
            tx.commit().context("Failed to commit ingest transaction")?;
            Ok(stats)
        }
        Err(e) => {
            warn!(error = %e, "Rolling back ingest transaction");
            if let Err(rollback) = tx.rollback() {
                warn!(error = %rollback, "Rollback failed");
            }
            Err(e)
        }
    }
}

/// Walk `source` and push every usable dump into `sink`.
pub fn run_batch<S: DiscSink>(
    source: &mut dyn DumpSource,
    sink: &mut S,
    opts: &IngestOptions,
) -> Result<IngestStats> {
    let start = Instant::now();
    let mut stats = IngestStats::default();
    let description = source.describe();
    info!("Ingesting {}", description);

    let spinner = create_spinner(&format!("Ingesting {}", description));
    source.for_each_entry(&mut |meta, reader| {
        stats.entries_seen += 1;
        ingest_entry(meta, reader, &mut *sink, opts, &mut stats)
            .with_context(|| format!("Failed to ingest {}", meta.path.display()))?;
        spinner.inc(1);
        log_progress("ingest", stats.entries_seen as u64, PROGRESS_LOG_INTERVAL);
        Ok(())
    })?;
    spinner.finish_with_message(format!("Ingested {} discs", stats.discs_inserted));

    stats.elapsed_seconds = start.elapsed().as_secs_f64();
    Ok(stats)
}

fn is_ignored(meta: &EntryMeta) -> bool {
    meta.file_name()
        .map_or(false, |name| IGNORED_FILES.contains(&name))
}

fn ingest_entry<S: DiscSink>(
    meta: &EntryMeta,
    reader: &mut dyn Read,
    sink: &mut S,
    opts: &IngestOptions,
    stats: &mut IngestStats,
) -> Result<()> {
    let path = meta.path.display();
    if !meta.is_file {
        stats.entries_ignored += 1;
        return Ok(());
    }
    if meta.size == 0 {
        info!(path = %path, "Ignoring empty file");
        stats.entries_ignored += 1;
        return Ok(());
    }
    if is_ignored(meta) {
        info!(path = %path, "Ignoring non-dump file");
        stats.entries_ignored += 1;
        return Ok(());
    }

    let shard: Result<Shard, UnknownShard> =
        resolve_shard(meta.partition().unwrap_or_default());
    let hint = meta.file_name().and_then(|name| Checksum::from_hex(name).ok());

    let record = parse_dump(
        reader,
        &ParseOptions {
            charset: opts.charset,
            shard: shard.as_ref().ok().copied(),
        },
    );

    let Some(checksum) = record.primary_checksum(hint.as_ref()) else {
        match record.parse_errors.iter().find(|e| e.is_structural()) {
            Some(err) => warn!(path = %path, error = %err, "Skipping malformed dump"),
            None => warn!(path = %path, errors = ?record.parse_errors, "Skipping dump without a usable DISCID"),
        }
        stats.entries_unusable += 1;
        return Ok(());
    };

    let shard = match shard {
        Ok(shard) => shard,
        Err(e) => {
            warn!(path = %path, error = %e, "Skipping dump");
            stats.entries_unknown_shard += 1;
            return Ok(());
        }
    };

    match hint {
        Some(hint) if !record.checksum_ids.contains(&hint) => {
            warn!(path = %path, ids = ?record.checksum_ids, "Filename checksum not listed in DISCID");
            stats.checksum_hint_mismatches += 1;
        }
        None => debug!(path = %path, "Filename is not a checksum"),
        _ => {}
    }
    for err in &record.parse_errors {
        debug!(path = %path, error = %err, "Parse diagnostic");
    }
    stats.parse_diagnostics += record.parse_errors.len();

    let id = compose_identity(checksum, shard);
    let row = sink.insert_disc(&id, &record)?;
    for (position, title) in record.tracks.iter().enumerate() {
        sink.insert_track(row, position, title)?;
    }
    stats.discs_inserted += 1;
    stats.tracks_inserted += record.tracks.len();
    Ok(())
}
