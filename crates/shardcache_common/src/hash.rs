//! Key hashing strategies.
//!
//! A [`HashAlgorithm`] turns a cache key into the digest that names its entry
//! on disk and drives the shard path. Each strategy carries a stable
//! identifier that is persisted in the cache descriptor, so a cache tree can
//! never be reopened with a different algorithm by accident.

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A deterministic mapping from a cache key to a digest string.
///
/// Implementations must be pure: the same key always yields the same digest.
/// Empty input must be accepted.
pub trait HashAlgorithm {
    /// Stable identifier recorded in the cache descriptor.
    fn id(&self) -> &str;

    /// Computes the digest of `key`.
    fn hash(&self, key: &[u8]) -> String;
}

/// MD5 content digest rendered as 32 lowercase hex characters.
///
/// The default strategy. Not suitable for security purposes, only for an
/// evenly distributed file layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Md5Hash;

impl HashAlgorithm for Md5Hash {
    fn id(&self) -> &str {
        "md5"
    }

    fn hash(&self, key: &[u8]) -> String {
        format!("{:x}", md5::compute(key))
    }
}

/// Renders every key byte as lowercase hex, without zero padding.
///
/// Produces human-inspectable filenames whose length grows with the key.
/// Bytes below `0x10` become a single character, so distinct keys may
/// collide; this matches cache trees written by earlier versions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HexString;

impl HashAlgorithm for HexString {
    fn id(&self) -> &str {
        "hexstring"
    }

    fn hash(&self, key: &[u8]) -> String {
        let mut out = String::with_capacity(key.len() * 2);
        for byte in key {
            // Writing into a String cannot fail.
            let _ = write!(out, "{byte:x}");
        }
        out
    }
}

/// XXH3-128 digest rendered as 32 lowercase hex characters.
///
/// Much faster than MD5 with comparable distribution; not cryptographic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Xxh3Hash;

impl HashAlgorithm for Xxh3Hash {
    fn id(&self) -> &str {
        "xxh3"
    }

    fn hash(&self, key: &[u8]) -> String {
        format!("{:032x}", xxhash_rust::xxh3::xxh3_128(key))
    }
}

/// The built-in hash strategies, selectable by name.
///
/// Used where the strategy comes from a configuration file rather than
/// from code. Each variant reports the same identifier as the concrete
/// type it dispatches to, so stores built either way share descriptors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    /// See [`Md5Hash`].
    #[default]
    Md5,
    /// See [`HexString`].
    HexString,
    /// See [`Xxh3Hash`].
    Xxh3,
}

impl HashKind {
    /// All built-in hash strategies.
    pub const ALL: [HashKind; 3] = [HashKind::Md5, HashKind::HexString, HashKind::Xxh3];
}

impl HashAlgorithm for HashKind {
    fn id(&self) -> &str {
        match self {
            HashKind::Md5 => Md5Hash.id(),
            HashKind::HexString => HexString.id(),
            HashKind::Xxh3 => Xxh3Hash.id(),
        }
    }

    fn hash(&self, key: &[u8]) -> String {
        match self {
            HashKind::Md5 => Md5Hash.hash(key),
            HashKind::HexString => HexString.hash(key),
            HashKind::Xxh3 => Xxh3Hash.hash(key),
        }
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for HashKind {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HashKind::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| UnknownStrategy {
                kind: "hash algorithm",
                name: s.to_string(),
            })
    }
}

/// A strategy name did not match any built-in hash algorithm or codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{name}'")]
pub struct UnknownStrategy {
    /// Which registry was searched ("hash algorithm" or "codec").
    pub kind: &'static str,
    /// The name that failed to resolve.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn md5_known_vector() {
        assert_eq!(Md5Hash.hash(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(Md5Hash.hash(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn hexstring_encodes_bytes() {
        assert_eq!(HexString.hash(b"user:42"), "757365723a3432");
    }

    #[test]
    fn hexstring_empty_input() {
        assert_eq!(HexString.hash(b""), "");
    }

    #[test]
    fn hexstring_low_bytes_are_unpadded() {
        assert_eq!(HexString.hash(b"\n"), "a");
        assert_eq!(HexString.hash(&[0x00, 0xff]), "0ff");
    }

    #[test]
    fn xxh3_is_fixed_width_hex() {
        for key in [&b""[..], b"a", b"a much longer key than the others"] {
            let digest = Xxh3Hash.hash(key);
            assert_eq!(digest.len(), 32);
            assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn kind_matches_concrete_strategy() {
        let key = b"some key";
        assert_eq!(HashKind::Md5.hash(key), Md5Hash.hash(key));
        assert_eq!(HashKind::HexString.hash(key), HexString.hash(key));
        assert_eq!(HashKind::Xxh3.hash(key), Xxh3Hash.hash(key));
        assert_eq!(HashKind::HexString.id(), HexString.id());
    }

    #[test]
    fn kind_parses_from_id() {
        for kind in HashKind::ALL {
            assert_eq!(kind.to_string().parse::<HashKind>(), Ok(kind));
        }
        let err = "sha1".parse::<HashKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown hash algorithm 'sha1'");
    }

    #[test]
    fn kind_serde_uses_id() {
        let json = serde_json::to_string(&HashKind::HexString).unwrap();
        assert_eq!(json, "\"hexstring\"");
        let back: HashKind = serde_json::from_str("\"xxh3\"").unwrap();
        assert_eq!(back, HashKind::Xxh3);
    }

    proptest! {
        #[test]
        fn hashing_is_deterministic(key in proptest::collection::vec(any::<u8>(), 0..64)) {
            for kind in HashKind::ALL {
                prop_assert_eq!(kind.hash(&key), kind.hash(&key));
            }
        }
    }
}
