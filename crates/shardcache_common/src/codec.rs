//! Payload encoding strategies.
//!
//! A [`Codec`] converts cached values to bytes and back. Stores never inspect
//! which codec is active; they only call [`Codec::encode`] and
//! [`Codec::decode`] and record [`Codec::id`] in their descriptor.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::hash::UnknownStrategy;

/// A payload could not be encoded or decoded.
#[derive(Debug, thiserror::Error)]
#[error("{codec} codec error: {reason}")]
pub struct CodecError {
    /// Identifier of the codec that failed.
    pub codec: String,
    /// Description of the failure.
    pub reason: String,
}

impl CodecError {
    /// Creates a new codec error.
    pub fn new(codec: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            codec: codec.into(),
            reason: reason.into(),
        }
    }
}

/// A reversible value/bytes transform.
///
/// For every value `v` the codec accepts, `decode(encode(v))` must equal `v`.
pub trait Codec {
    /// Stable identifier recorded in the cache descriptor.
    fn id(&self) -> &str;

    /// Serializes `value` into a byte payload.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Deserializes a payload previously produced by [`Codec::encode`].
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// JSON payloads via `serde_json`.
///
/// Human-readable. Untyped reads (`serde_json::Value`) return maps for
/// structs, so callers wanting full type fidelity should decode into the
/// concrete type they stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn id(&self) -> &str {
        "json"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::new(self.id(), e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::new(self.id(), e.to_string()))
    }
}

/// Compact binary payloads via `bincode` with the standard configuration.
///
/// Preserves the full structure of any serde type, but the bytes are only
/// meaningful to a reader that knows the exact Rust type. Self-describing
/// types such as `serde_json::Value` are not supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn id(&self) -> &str {
        "bincode"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        bincode::serde::encode_to_vec(value, bincode::config::standard())
            .map_err(|e| CodecError::new(self.id(), e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        let (value, read) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| CodecError::new(self.id(), e.to_string()))?;
        if read != bytes.len() {
            return Err(CodecError::new(
                self.id(),
                format!("{} trailing bytes after payload", bytes.len() - read),
            ));
        }
        Ok(value)
    }
}

/// The built-in codecs, selectable by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    /// See [`JsonCodec`].
    #[default]
    Json,
    /// See [`BincodeCodec`].
    Bincode,
}

impl CodecKind {
    /// All built-in codecs.
    pub const ALL: [CodecKind; 2] = [CodecKind::Json, CodecKind::Bincode];
}

impl Codec for CodecKind {
    fn id(&self) -> &str {
        match self {
            CodecKind::Json => JsonCodec.id(),
            CodecKind::Bincode => BincodeCodec.id(),
        }
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        match self {
            CodecKind::Json => JsonCodec.encode(value),
            CodecKind::Bincode => BincodeCodec.encode(value),
        }
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        match self {
            CodecKind::Json => JsonCodec.decode(bytes),
            CodecKind::Bincode => BincodeCodec.decode(bytes),
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for CodecKind {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CodecKind::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| UnknownStrategy {
                kind: "codec",
                name: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        age: u32,
        tags: Vec<String>,
        manager: Option<Box<Profile>>,
    }

    fn sample() -> Profile {
        Profile {
            name: "Ann".to_string(),
            age: 42,
            tags: vec!["admin".to_string()],
            manager: Some(Box::new(Profile {
                name: "Bob".to_string(),
                age: 50,
                tags: vec![],
                manager: None,
            })),
        }
    }

    #[test]
    fn json_roundtrip_struct() {
        let bytes = JsonCodec.encode(&sample()).unwrap();
        let back: Profile = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn json_is_readable_text() {
        let bytes = JsonCodec.encode(&serde_json::json!({"name": "Ann"})).unwrap();
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), r#"{"name":"Ann"}"#);
    }

    #[test]
    fn json_untyped_read_yields_map() {
        let bytes = JsonCodec.encode(&sample()).unwrap();
        let value: serde_json::Value = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(value["manager"]["name"], "Bob");
    }

    #[test]
    fn bincode_roundtrip_struct() {
        let bytes = BincodeCodec.encode(&sample()).unwrap();
        let back: Profile = BincodeCodec.decode(&bytes).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn bincode_roundtrip_map() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), vec![1u8, 2, 3]);
        map.insert("b".to_string(), vec![]);
        let bytes = BincodeCodec.encode(&map).unwrap();
        let back: BTreeMap<String, Vec<u8>> = BincodeCodec.decode(&bytes).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn json_garbage_is_codec_error() {
        let err = JsonCodec.decode::<Profile>(b"not json {{{").unwrap_err();
        assert_eq!(err.codec, "json");
        assert!(err.to_string().starts_with("json codec error"));
    }

    #[test]
    fn bincode_trailing_bytes_rejected() {
        let mut bytes = BincodeCodec.encode(&7u32).unwrap();
        bytes.extend_from_slice(b"junk");
        let err = BincodeCodec.decode::<u32>(&bytes).unwrap_err();
        assert!(err.reason.contains("trailing bytes"));
    }

    #[test]
    fn bincode_truncated_is_codec_error() {
        let bytes = BincodeCodec.encode(&sample()).unwrap();
        assert!(BincodeCodec.decode::<Profile>(&bytes[..3]).is_err());
    }

    #[test]
    fn kind_dispatch_and_names() {
        for kind in CodecKind::ALL {
            let bytes = kind.encode(&sample()).unwrap();
            let back: Profile = kind.decode(&bytes).unwrap();
            assert_eq!(back, sample());
            assert_eq!(kind.to_string().parse::<CodecKind>(), Ok(kind));
        }
        assert_eq!(CodecKind::Json.id(), JsonCodec.id());
        assert!("php".parse::<CodecKind>().is_err());
    }

    proptest! {
        #[test]
        fn roundtrip_law(
            name in ".*",
            age in any::<u32>(),
            tags in proptest::collection::vec(".*", 0..4),
        ) {
            let value = Profile { name, age, tags, manager: None };
            for kind in CodecKind::ALL {
                let bytes = kind.encode(&value).unwrap();
                let back: Profile = kind.decode(&bytes).unwrap();
                prop_assert_eq!(&back, &value);
            }
        }
    }
}
