//! Line classification for xmcd dumps.
//!
//! Every line of a dump is one of a small set of anchored shapes: the
//! `# xmcd` format marker, `#`-prefixed metadata comments (track offsets and
//! the disc length), or `KEY=VALUE` pairs. Anything else is ignored so that
//! unknown extensions don't break parsing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::ParseError;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// First non-blank line of every dump.
pub static FORMAT_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#\s+xmcd").unwrap());

/// Track start offset inside the "Track frame offsets" comment block: "#       150"
pub static OFFSET_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#\s+([0-9]+)\s*$").unwrap());

/// "# Disc length: 2000 seconds"
pub static DISC_LENGTH_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\s*Disc length:\s*([0-9]+)\s*(?:seconds|secs)\s*$").unwrap());

/// Recognized keys. Keys are exact and case-sensitive; the value is
/// everything after the first '='.
pub static KEY_VALUE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(DISCID|DTITLE|DYEAR|DGENRE|TTITLE[0-9]+|EXTD|EXTT[0-9]+|PLAYORDER)=").unwrap()
});

/// First run of digits, used for track positions and years.
pub static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

// ============================================================================
// LINE KINDS
// ============================================================================

/// A recognized dump line with its payload borrowed from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<'a> {
    /// Decimal digits of a track start offset.
    Offset(&'a str),
    /// Decimal digits of the disc length in seconds.
    DiscLength(&'a str),
    DiscId(&'a str),
    DiscTitle(&'a str),
    Year(&'a str),
    Genre(&'a str),
    TrackTitle { key: &'a str, value: &'a str },
    ExtendedData(&'a str),
    ExtendedTrack { key: &'a str, value: &'a str },
    PlayOrder(&'a str),
}

pub fn is_format_marker(line: &str) -> bool {
    FORMAT_MARKER.is_match(line)
}

/// Classify a single line. Returns `None` for lines the parser ignores.
pub fn classify(line: &str) -> Option<Field<'_>> {
    if line.starts_with('#') {
        if let Some(caps) = OFFSET_LINE.captures(line) {
            return caps.get(1).map(|m| Field::Offset(m.as_str()));
        }
        if let Some(caps) = DISC_LENGTH_LINE.captures(line) {
            return caps.get(1).map(|m| Field::DiscLength(m.as_str()));
        }
        return None;
    }

    if !KEY_VALUE_LINE.is_match(line) {
        return None;
    }
    let (key, value) = split_pair(line)?;
    let field = match key {
        "DISCID" => Field::DiscId(value),
        "DTITLE" => Field::DiscTitle(value),
        "DYEAR" => Field::Year(value),
        "DGENRE" => Field::Genre(value),
        "EXTD" => Field::ExtendedData(value),
        "PLAYORDER" => Field::PlayOrder(value),
        k if k.starts_with("TTITLE") => Field::TrackTitle { key, value },
        k if k.starts_with("EXTT") => Field::ExtendedTrack { key, value },
        _ => return None,
    };
    Some(field)
}

/// Split `KEY=VALUE` on the first '='. Values may contain '=' themselves.
pub fn split_pair(line: &str) -> Option<(&str, &str)> {
    line.split_once('=')
}

/// Track position embedded in a key such as `TTITLE7`.
pub fn position_number(key: &str) -> Result<usize, ParseError> {
    NUMBER
        .find(key)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| ParseError::Position {
            key: key.to_string(),
        })
}

/// First run of digits in a value, if any.
pub fn first_number(value: &str) -> Option<&str> {
    NUMBER.find(value).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_marker() {
        assert!(is_format_marker("# xmcd"));
        assert!(is_format_marker("# xmcd CD database file"));
        assert!(!is_format_marker("DISCID=decafbad"));
        assert!(!is_format_marker("xmcd"));
        assert!(!is_format_marker("#xmcd-ish garbage"));
    }

    #[test]
    fn test_offset_line() {
        assert_eq!(classify("#       139870"), Some(Field::Offset("139870")));
        assert_eq!(classify("#\t150"), Some(Field::Offset("150")));
        assert_eq!(classify("#150"), None);
        assert_eq!(classify("# Track frame offsets:"), None);
    }

    #[test]
    fn test_disc_length_line() {
        assert_eq!(
            classify("# Disc length: 2000 seconds"),
            Some(Field::DiscLength("2000"))
        );
        assert_eq!(
            classify("# Disc length: 3053 secs"),
            Some(Field::DiscLength("3053"))
        );
        assert_eq!(classify("# Disc length: unknown"), None);
    }

    #[test]
    fn test_key_value_lines() {
        assert_eq!(classify("DISCID=decafbad"), Some(Field::DiscId("decafbad")));
        assert_eq!(classify("DTITLE=A / B"), Some(Field::DiscTitle("A / B")));
        assert_eq!(classify("DYEAR=2005"), Some(Field::Year("2005")));
        assert_eq!(classify("DGENRE="), Some(Field::Genre("")));
        assert_eq!(
            classify("TTITLE12=Song"),
            Some(Field::TrackTitle {
                key: "TTITLE12",
                value: "Song"
            })
        );
        assert_eq!(
            classify("EXTT0=notes"),
            Some(Field::ExtendedTrack {
                key: "EXTT0",
                value: "notes"
            })
        );
        assert_eq!(classify("EXTD=YEAR: 1999"), Some(Field::ExtendedData("YEAR: 1999")));
        assert_eq!(classify("PLAYORDER=1,2"), Some(Field::PlayOrder("1,2")));
    }

    #[test]
    fn test_value_keeps_equals() {
        assert_eq!(
            classify("TTITLE0=E=mc2"),
            Some(Field::TrackTitle {
                key: "TTITLE0",
                value: "E=mc2"
            })
        );
    }

    #[test]
    fn test_unknown_lines_ignored() {
        assert_eq!(classify("TTITLE=missing position"), None);
        assert_eq!(classify("dtitle=lowercase"), None);
        assert_eq!(classify("FOO=bar"), None);
        assert_eq!(classify(""), None);
        assert_eq!(classify("# Revision: 3"), None);
    }

    #[test]
    fn test_split_pair() {
        assert_eq!(split_pair("key=value"), Some(("key", "value")));
        assert_eq!(split_pair("key="), Some(("key", "")));
        assert_eq!(split_pair("novalue"), None);
    }

    #[test]
    fn test_position_number() {
        assert_eq!(position_number("SOMETHING3"), Ok(3));
        assert_eq!(position_number("TTITLE07"), Ok(7));
        assert!(position_number("TTITLE").is_err());
        assert!(position_number("TTITLE99999999999999999999999").is_err());
    }

    #[test]
    fn test_first_number() {
        assert_eq!(first_number("2005"), Some("2005"));
        assert_eq!(first_number("c. 1971"), Some("1971"));
        assert_eq!(first_number(""), None);
    }
}
