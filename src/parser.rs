//! Single-pass parser for freedb xmcd dumps.
//!
//! The parser never fails outright. Problems are attached to the returned
//! [`DiscRecord`] as [`ParseError`] diagnostics and the caller decides
//! whether the record is usable (`DiscRecord::is_usable`).

use std::io::Read;

use crate::fields::{self, Field};
use crate::identity::{Checksum, Shard};
use crate::models::{DiscRecord, ParseError, MAX_TRACKS};
use crate::text::{decode_dump, to_valid_text, Charset};

/// Per-run parser settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub charset: Charset,
    /// Partition the dump was filed under, copied onto the record.
    pub shard: Option<Shard>,
}

/// Read, decode and parse one dump.
pub fn parse_dump<R: Read>(mut dump: R, opts: &ParseOptions) -> DiscRecord {
    let mut bytes = Vec::new();
    if let Err(e) = dump.read_to_end(&mut bytes) {
        let mut disc = DiscRecord {
            shard: opts.shard,
            ..Default::default()
        };
        disc.append_err(ParseError::Read(e.to_string()));
        return disc;
    }
    parse_bytes(&bytes, opts)
}

pub fn parse_bytes(bytes: &[u8], opts: &ParseOptions) -> DiscRecord {
    let decoded = decode_dump(bytes, opts.charset);
    let mut disc = parse_text(&decoded.text, opts);
    if decoded.had_errors {
        disc.append_err(ParseError::Decode {
            encoding: decoded.encoding.to_string(),
        });
    }
    disc
}

/// Parse already-decoded dump text.
pub fn parse_text(text: &str, opts: &ParseOptions) -> DiscRecord {
    let mut disc = DiscRecord {
        shard: opts.shard,
        offsets: Vec::with_capacity(20),
        tracks: Vec::with_capacity(20),
        checksum_ids: Vec::with_capacity(2),
        ..Default::default()
    };

    let mut lines = text
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .skip_while(|line| line.trim().is_empty());

    // first line should identify the xmcd filetype
    match lines.next() {
        Some(first) if fields::is_format_marker(first) => {}
        _ => {
            disc.append_err(ParseError::NotXmcd);
            return disc;
        }
    }

    for line in lines {
        if let Some(field) = fields::classify(line) {
            apply_field(&mut disc, field, line);
        }
    }
    disc
}

fn apply_field(disc: &mut DiscRecord, field: Field<'_>, line: &str) {
    match field {
        Field::Offset(digits) => match digits.parse::<u32>() {
            Ok(offset) => disc.offsets.push(offset),
            Err(_) => {
                disc.append_err(ParseError::Offset {
                    line: line.to_string(),
                });
            }
        },
        Field::DiscLength(digits) => match digits.parse::<u16>() {
            Ok(seconds) => disc.duration = seconds,
            Err(_) => {
                disc.append_err(ParseError::DiscLength {
                    line: line.to_string(),
                });
            }
        },
        Field::DiscId(value) => {
            for token in value.split(',').map(str::trim) {
                match Checksum::from_hex(token) {
                    Ok(checksum) => disc.checksum_ids.push(checksum),
                    Err(e) => {
                        disc.append_err(e.into());
                    }
                }
            }
        }
        Field::DiscTitle(value) => disc.title.push_str(&to_valid_text(value)),
        Field::TrackTitle { key, value } => {
            if let Err(e) = merge_positional(&mut disc.tracks, key, value) {
                disc.append_err(e);
            }
        }
        Field::ExtendedData(value) => disc.extended_data.push_str(&to_valid_text(value)),
        Field::ExtendedTrack { key, value } => {
            if let Err(e) = merge_positional(&mut disc.extended_tracks, key, value) {
                disc.append_err(e);
            }
        }
        // legacy dumps routinely leave the year blank or write junk in it
        Field::Year(value) => {
            if let Some(year) = fields::first_number(value).and_then(|d| d.parse().ok()) {
                disc.year = Some(year);
            }
        }
        // an empty line never clears a value seen earlier
        Field::Genre(value) => {
            if let Some(genre) = non_empty(value) {
                disc.genre = Some(genre);
            }
        }
        Field::PlayOrder(value) => {
            if let Some(order) = non_empty(value) {
                disc.play_order = Some(order);
            }
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = to_valid_text(value);
    if value.is_empty() {
        None
    } else {
        Some(value.into_owned())
    }
}

/// Merge a positional line (`TTITLEn`, `EXTTn`) into `entries`.
///
/// - position < len: continuation, appended to the existing entry
/// - position == len: new entry
/// - position > len: gap padded with empty entries, reported as `TrackGap`
/// - position >= MAX_TRACKS: dropped, reported as `TrackOutOfRange`
fn merge_positional(entries: &mut Vec<String>, key: &str, value: &str) -> Result<(), ParseError> {
    let position = fields::position_number(key)?;
    if position >= MAX_TRACKS {
        return Err(ParseError::TrackOutOfRange {
            key: key.to_string(),
            position,
        });
    }

    let value = to_valid_text(value);
    let len = entries.len();
    if position < len {
        entries[position].push_str(&value);
        return Ok(());
    }

    entries.resize(position, String::new());
    entries.push(value.into_owned());
    if position > len {
        return Err(ParseError::TrackGap {
            key: key.to_string(),
            position,
            len,
        });
    }
    Ok(())
}
