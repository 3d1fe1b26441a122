//! Decoding and cleanup of dump text.
//!
//! freedb dumps were submitted by thousands of different clients over two
//! decades, so the encoding of a file is anyone's guess. Most are UTF-8 or
//! ISO-8859-1 / Windows-1252. Field values are cleaned so that invalid
//! sequences disappear instead of leaving replacement characters behind.

use chardetng::EncodingDetector;
use clap::ValueEnum;
use encoding_rs::Encoding;
use std::borrow::Cow;

/// How the raw bytes of a dump are turned into text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Charset {
    /// Take valid UTF-8 as is, otherwise guess the legacy encoding.
    #[default]
    Detect,
    /// Always UTF-8; invalid byte sequences are dropped.
    Utf8,
}

/// Result of decoding one dump.
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static str,
    pub had_errors: bool,
}

pub fn decode_dump(bytes: &[u8], charset: Charset) -> DecodedText {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedText {
            text: text.to_string(),
            encoding: "UTF-8",
            had_errors: false,
        };
    }

    match charset {
        Charset::Utf8 => DecodedText {
            text: utf8_dropping_invalid(bytes),
            encoding: "UTF-8",
            had_errors: true,
        },
        Charset::Detect => {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            let encoding: &'static Encoding = detector.guess(None, true);
            let (decoded, had_errors) = encoding.decode_without_bom_handling(bytes);
            DecodedText {
                text: decoded.into_owned(),
                encoding: encoding.name(),
                had_errors,
            }
        }
    }
}

/// Decode UTF-8, skipping every invalid sequence.
fn utf8_dropping_invalid(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                // valid_up_to guarantees this prefix is UTF-8
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match e.error_len() {
                    Some(len) => bytes = &rest[len..],
                    None => return out,
                }
            }
        }
    }
}

fn is_invalid_unit(c: char) -> bool {
    c == '\u{FFFD}' || c == '\0'
}

/// Strip replacement characters and NULs left over from decoding.
pub fn to_valid_text(value: &str) -> Cow<'_, str> {
    if value.contains(is_invalid_unit) {
        Cow::Owned(value.chars().filter(|c| !is_invalid_unit(*c)).collect())
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_passthrough() {
        let decoded = decode_dump("# xmcd\nDTITLE=Björk / Post\n".as_bytes(), Charset::Detect);
        assert_eq!(decoded.text, "# xmcd\nDTITLE=Björk / Post\n");
        assert_eq!(decoded.encoding, "UTF-8");
        assert!(!decoded.had_errors);
    }

    #[test]
    fn test_bom_stripped() {
        let decoded = decode_dump(b"\xEF\xBB\xBF# xmcd\n", Charset::Utf8);
        assert_eq!(decoded.text, "# xmcd\n");
    }

    #[test]
    fn test_latin1_detected() {
        // "Motörhead" in ISO-8859-1
        let bytes = b"# xmcd\nDTITLE=Mot\xF6rhead / Ace of Spades\n";
        let decoded = decode_dump(bytes, Charset::Detect);
        assert!(decoded.text.contains("Motörhead"));
        assert!(!decoded.had_errors);
    }

    #[test]
    fn test_utf8_drops_invalid_sequences() {
        let bytes = b"DTITLE=Mot\xF6rhead\xFF!";
        let decoded = decode_dump(bytes, Charset::Utf8);
        assert_eq!(decoded.text, "DTITLE=Motrhead!");
        assert!(decoded.had_errors);
    }

    #[test]
    fn test_truncated_sequence_at_end() {
        assert_eq!(utf8_dropping_invalid(b"abc\xE2\x82"), "abc");
    }

    #[test]
    fn test_to_valid_text() {
        assert_eq!(to_valid_text("Intro\u{FFFD}duction"), "Introduction");
        assert_eq!(to_valid_text("a\0b"), "ab");
        assert!(matches!(to_valid_text("clean"), Cow::Borrowed("clean")));
    }
}
