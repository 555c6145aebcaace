//! Error types for file store operations.

use std::path::PathBuf;

use shardcache_common::CodecError;

/// Errors that can occur while opening or using a [`ShardedFileStore`](crate::ShardedFileStore).
///
/// A missing entry is not an error for reads; only
/// [`unset`](crate::ShardedFileStore::unset) reports it.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache root or a shard directory could not be created.
    #[error("could not initialize cache directory {path}: {source}")]
    DirectoryInit {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The cache root was created with a different configuration.
    #[error("cache configuration mismatch on {field}: stored {stored}, requested {requested}")]
    ConfigMismatch {
        /// The descriptor field that disagrees (`levels`, `codec` or `hashalgo`).
        field: &'static str,
        /// The value recorded in the descriptor.
        stored: String,
        /// The value the store was opened with.
        requested: String,
    },

    /// The requested shard depth is outside the supported range.
    #[error("invalid shard levels {levels}: must be between 0 and {max}")]
    InvalidLevels {
        /// The rejected depth.
        levels: u8,
        /// The largest accepted depth.
        max: u8,
    },

    /// `unset` targeted a key that has no entry.
    #[error("no cache entry for key '{key}' at {path}")]
    EntryNotFound {
        /// The cache key.
        key: String,
        /// Where the entry would have been.
        path: PathBuf,
    },

    /// An entry payload could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The `cache_config` descriptor exists but could not be parsed.
    #[error("failed to parse cache descriptor {path}: {reason}")]
    DescriptorParse {
        /// The descriptor file path.
        path: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// The hash algorithm produced an empty digest, which cannot name a file.
    #[error("hash algorithm produced an empty digest for key '{key}'")]
    EmptyDigest {
        /// The cache key.
        key: String,
    },

    /// The hash algorithm produced a digest that is not a plain file name,
    /// or whose shard segments would leave the cache root.
    #[error("hash algorithm produced unusable digest '{digest}' for key '{key}'")]
    InvalidDigest {
        /// The cache key.
        key: String,
        /// The rejected digest.
        digest: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_init_display() {
        let err = CacheError::DirectoryInit {
            path: PathBuf::from("/readonly/cache"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("could not initialize cache directory"));
        assert!(msg.contains("/readonly/cache"));
    }

    #[test]
    fn config_mismatch_display() {
        let err = CacheError::ConfigMismatch {
            field: "levels",
            stored: "3".to_string(),
            requested: "2".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cache configuration mismatch on levels: stored 3, requested 2"
        );
    }

    #[test]
    fn invalid_levels_display() {
        let err = CacheError::InvalidLevels { levels: 11, max: 10 };
        assert_eq!(
            err.to_string(),
            "invalid shard levels 11: must be between 0 and 10"
        );
    }

    #[test]
    fn entry_not_found_display() {
        let err = CacheError::EntryNotFound {
            key: "user:42".to_string(),
            path: PathBuf::from("ab/cd/abcd"),
        };
        let msg = err.to_string();
        assert!(msg.contains("user:42"));
        assert!(msg.contains("abcd"));
    }

    #[test]
    fn codec_error_is_transparent() {
        let err = CacheError::from(CodecError::new("json", "EOF while parsing"));
        assert_eq!(err.to_string(), "json codec error: EOF while parsing");
    }

    #[test]
    fn invalid_digest_display() {
        let err = CacheError::InvalidDigest {
            key: "k".to_string(),
            digest: "../x".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "hash algorithm produced unusable digest '../x' for key 'k'"
        );
    }

    #[test]
    fn descriptor_parse_display() {
        let err = CacheError::DescriptorParse {
            path: PathBuf::from("cache_config"),
            reason: "expected value".to_string(),
        };
        assert!(err.to_string().contains("expected value"));
    }
}
