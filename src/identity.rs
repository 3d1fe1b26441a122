//! Disc identity: legacy checksums, partition shards and the composite key.
//!
//! The freedb DISCID is a 4-byte rolling sum that collides across unrelated
//! discs. The partition a dump was filed under (historically a genre label)
//! is folded into the key so the pair can serve as a primary key.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of significant hex characters in a DISCID token.
pub const CHECKSUM_HEX_LEN: usize = 8;

// ============================================================================
// Checksum
// ============================================================================

/// Errors decoding a single DISCID token.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChecksumError {
    #[error("disc ID too short: {0:?}")]
    TooShort(String),

    #[error("disc ID {token:?} is not hexadecimal: {source}")]
    NotHex {
        token: String,
        source: hex::FromHexError,
    },
}

/// Raw 4-byte legacy checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Checksum([u8; 4]);

impl Checksum {
    /// Decode a DISCID token. Only the first 8 hex characters are kept;
    /// anything after them is ignored.
    pub fn from_hex(token: &str) -> Result<Self, ChecksumError> {
        if token.len() < CHECKSUM_HEX_LEN {
            return Err(ChecksumError::TooShort(token.to_string()));
        }
        let not_hex = |source: hex::FromHexError| ChecksumError::NotHex {
            token: token.to_string(),
            source,
        };
        let head = token
            .get(..CHECKSUM_HEX_LEN)
            .ok_or_else(|| not_hex(hex::FromHexError::InvalidStringLength))?;
        let mut bytes = [0u8; 4];
        hex::decode_to_slice(head, &mut bytes).map_err(not_hex)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Checksum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

// ============================================================================
// Shards
// ============================================================================

/// Unknown partition name, carrying the offending string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown shard name: {0:?}")]
pub struct UnknownShard(pub String);

/// The fixed set of freedb partitions, in their canonical order.
/// The discriminant is the one-byte index stored in composite keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Shard {
    Blues = 0,
    Classical = 1,
    Country = 2,
    Data = 3,
    Folk = 4,
    Jazz = 5,
    Misc = 6,
    NewAge = 7,
    Reggae = 8,
    Rock = 9,
    Soundtrack = 10,
}

impl Shard {
    pub const ALL: [Shard; 11] = [
        Shard::Blues,
        Shard::Classical,
        Shard::Country,
        Shard::Data,
        Shard::Folk,
        Shard::Jazz,
        Shard::Misc,
        Shard::NewAge,
        Shard::Reggae,
        Shard::Rock,
        Shard::Soundtrack,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Directory name used by freedb dumps.
    pub fn name(self) -> &'static str {
        match self {
            Shard::Blues => "blues",
            Shard::Classical => "classical",
            Shard::Country => "country",
            Shard::Data => "data",
            Shard::Folk => "folk",
            Shard::Jazz => "jazz",
            Shard::Misc => "misc",
            Shard::NewAge => "newage",
            Shard::Reggae => "reggae",
            Shard::Rock => "rock",
            Shard::Soundtrack => "soundtrack",
        }
    }
}

impl FromStr for Shard {
    type Err = UnknownShard;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shard::ALL
            .iter()
            .copied()
            .find(|shard| shard.name() == s)
            .ok_or_else(|| UnknownShard(s.to_string()))
    }
}

impl fmt::Display for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Shard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Look up a partition by its directory name (case-sensitive).
pub fn resolve_shard(name: &str) -> Result<Shard, UnknownShard> {
    name.parse()
}

// ============================================================================
// Composite identity
// ============================================================================

/// Checksum bytes followed by the shard index: the storage primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeId([u8; 5]);

impl CompositeId {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn shard_index(&self) -> u8 {
        self.0[4]
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

pub fn compose_identity(checksum: &Checksum, shard: Shard) -> CompositeId {
    let [a, b, c, d] = checksum.0;
    CompositeId([a, b, c, d, shard.index()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_hex_round_trip() {
        let checksum = Checksum::from_hex("decafbad").unwrap();
        assert_eq!(checksum.as_bytes(), &[0xde, 0xca, 0xfb, 0xad]);
        assert_eq!(checksum.to_hex(), "decafbad");
    }

    #[test]
    fn test_only_first_eight_chars_significant() {
        let checksum = Checksum::from_hex("A50D0C0Cffff").unwrap();
        assert_eq!(checksum.to_hex(), "a50d0c0c");
    }

    #[test]
    fn test_short_checksum_rejected() {
        assert_eq!(
            Checksum::from_hex("abc123"),
            Err(ChecksumError::TooShort("abc123".to_string()))
        );
    }

    #[test]
    fn test_non_hex_checksum_rejected() {
        assert!(matches!(
            Checksum::from_hex("decafbaz"),
            Err(ChecksumError::NotHex { .. })
        ));
        // multi-byte char straddling the 8th byte
        assert!(matches!(
            Checksum::from_hex("decafbaé"),
            Err(ChecksumError::NotHex { .. })
        ));
    }

    #[test]
    fn test_shard_order() {
        let names: Vec<&str> = Shard::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "blues",
                "classical",
                "country",
                "data",
                "folk",
                "jazz",
                "misc",
                "newage",
                "reggae",
                "rock",
                "soundtrack"
            ]
        );
        for (i, shard) in Shard::ALL.iter().enumerate() {
            assert_eq!(shard.index() as usize, i);
        }
    }

    #[test]
    fn test_resolve_shard() {
        assert_eq!(resolve_shard("soundtrack"), Ok(Shard::Soundtrack));
        assert_eq!(resolve_shard("soundtrack").unwrap().index(), 10);
        assert_eq!(
            resolve_shard("Rock"),
            Err(UnknownShard("Rock".to_string()))
        );
        let err = resolve_shard("polka").unwrap_err();
        assert!(err.to_string().contains("polka"));
    }

    #[test]
    fn test_compose_identity() {
        let checksum = Checksum::from_hex("decafbad").unwrap();
        let id = compose_identity(&checksum, Shard::Soundtrack);
        assert_eq!(id.as_bytes(), &[0xde, 0xca, 0xfb, 0xad, 10]);
        assert_eq!(id.to_string(), "decafbad0a");
        assert_eq!(id.shard_index(), 10);
        assert_eq!(id, compose_identity(&checksum, Shard::Soundtrack));
    }

    #[test]
    fn test_compose_identity_injective() {
        let checksums = ["decafbad", "decafbae", "00000000", "ffffffff"]
            .map(|h| Checksum::from_hex(h).unwrap());
        let mut seen = HashSet::new();
        for checksum in &checksums {
            for shard in Shard::ALL {
                assert!(seen.insert(compose_identity(checksum, shard)));
            }
        }
        assert_eq!(seen.len(), checksums.len() * Shard::ALL.len());
    }
}
