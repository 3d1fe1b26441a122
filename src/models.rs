//! Core data models for freedb ingestion.
//!
//! This module contains the parsed disc record, the per-dump diagnostics
//! collected while building it, and the run statistics of the pipeline.

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::identity::{Checksum, ChecksumError, Shard};

/// CD-DA allows at most 99 tracks, numbered TTITLE0..TTITLE98 in xmcd.
pub const MAX_TRACKS: usize = 99;

// ============================================================================
// Parse Diagnostics
// ============================================================================

/// Problems found while parsing one dump. None of these abort the parse on
/// their own; the record stays usable as long as one checksum survives.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// First non-blank line is not the `# xmcd` marker. Parsing stops.
    #[error("not an xmcd format dump")]
    NotXmcd,

    /// The entry could not be read. Parsing stops.
    #[error("error reading dump: {0}")]
    Read(String),

    /// Invalid byte sequences were dropped while decoding the entry.
    #[error("invalid byte sequences dropped while decoding as {encoding}")]
    Decode { encoding: String },

    #[error("error parsing offset from {line:?}")]
    Offset { line: String },

    #[error("error parsing disc length from {line:?}")]
    DiscLength { line: String },

    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    #[error("key {key:?} has no position number")]
    Position { key: String },

    /// Position at or beyond the CD track limit; the line is dropped.
    #[error("key {key:?} position {position} exceeds the {}-track limit", MAX_TRACKS)]
    TrackOutOfRange { key: String, position: usize },

    /// Position skipped past the next expected track; the gap was padded
    /// with empty titles.
    #[error("key {key:?} position {position} skips ahead of {len} known entries")]
    TrackGap {
        key: String,
        position: usize,
        len: usize,
    },
}

impl ParseError {
    /// Errors that stop the parse before any field is read.
    pub fn is_structural(&self) -> bool {
        matches!(self, ParseError::NotXmcd | ParseError::Read(_))
    }
}

// ============================================================================
// Disc Record
// ============================================================================

/// Parsed contents of one freedb dump.
///
/// Produced fresh per dump by [`crate::parser`] and not modified afterwards.
/// An empty `checksum_ids` means the dump is unusable and must be skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiscRecord {
    /// Every legacy checksum listed on the DISCID line(s), in file order.
    pub checksum_ids: Vec<Checksum>,
    /// Partition the dump was filed under, when known.
    pub shard: Option<Shard>,
    /// Combined "Artist / Album" title, continuation lines concatenated.
    pub title: String,
    pub genre: Option<String>,
    pub year: Option<u16>,
    /// Track start positions in frames, in file order.
    pub offsets: Vec<u32>,
    /// Total disc length in seconds.
    pub duration: u16,
    /// `tracks[i]` is the title of track i (zero-based, as in TTITLEi).
    pub tracks: Vec<String>,
    pub extended_data: String,
    pub extended_tracks: Vec<String>,
    pub play_order: Option<String>,
    #[serde(serialize_with = "serialize_errors")]
    pub parse_errors: Vec<ParseError>,
}

impl DiscRecord {
    pub fn is_usable(&self) -> bool {
        !self.checksum_ids.is_empty()
    }

    /// Record a diagnostic, returning how many have been collected.
    pub fn append_err(&mut self, err: ParseError) -> usize {
        self.parse_errors.push(err);
        self.parse_errors.len()
    }

    /// Checksum to key the record under: the filename hint when the dump
    /// lists it, otherwise the first DISCID.
    pub fn primary_checksum(&self, hint: Option<&Checksum>) -> Option<&Checksum> {
        hint.and_then(|h| self.checksum_ids.iter().find(|c| *c == h))
            .or_else(|| self.checksum_ids.first())
    }
}

fn serialize_errors<S: Serializer>(errors: &[ParseError], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().map(|e| e.to_string()))
}

// ============================================================================
// Statistics
// ============================================================================

/// Counters for one ingestion run.
#[derive(Default, Debug, Clone, PartialEq, Serialize)]
pub struct IngestStats {
    pub entries_seen: usize,
    /// Directories, empty files and ignore-listed names.
    pub entries_ignored: usize,
    pub entries_unusable: usize,
    pub entries_unknown_shard: usize,
    pub discs_inserted: usize,
    pub tracks_inserted: usize,
    /// Field-level diagnostics across all inserted discs.
    pub parse_diagnostics: usize,
    /// Filename checksum not among the DISCIDs inside the file.
    pub checksum_hint_mismatches: usize,
    pub elapsed_seconds: f64,
}

impl IngestStats {
    pub fn entries_skipped(&self) -> usize {
        self.entries_unusable + self.entries_unknown_shard
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
