//! The persisted configuration guard of a cache root.
//!
//! The descriptor is stored as `cache_config` in the cache root the first
//! time a store is opened there, recording the shard depth, codec and hash
//! algorithm. Every later open must request the same triple: entries written
//! under one configuration are unreadable, or unreachable, under another.
//!
//! The file is always JSON, independently of the codec used for entries, so
//! it stays readable whatever the store is reopened with.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Name of the descriptor file within the cache root.
pub const DESCRIPTOR_FILE: &str = "cache_config";

/// The configuration a cache root is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDescriptor {
    /// Shard depth.
    pub levels: u8,
    /// Identifier of the entry codec.
    pub codec: String,
    /// Identifier of the key hash algorithm.
    pub hashalgo: String,
}

/// Whether a cache root has been bound to a configuration yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorState {
    /// No descriptor file exists.
    Uninitialized,
    /// A descriptor exists and holds this configuration.
    Bound(CacheDescriptor),
}

impl CacheDescriptor {
    /// Creates a descriptor from its three fields.
    pub fn new(levels: u8, codec: impl Into<String>, hashalgo: impl Into<String>) -> Self {
        Self {
            levels,
            codec: codec.into(),
            hashalgo: hashalgo.into(),
        }
    }

    /// Path of the descriptor file for a cache root.
    pub fn path(cache_dir: &Path) -> PathBuf {
        cache_dir.join(DESCRIPTOR_FILE)
    }

    /// Reads the descriptor state of a cache root.
    ///
    /// A missing file means [`DescriptorState::Uninitialized`]. An unreadable
    /// or malformed file is an error: the root may hold entries, so it is
    /// never treated as fresh.
    pub fn load(cache_dir: &Path) -> Result<DescriptorState, CacheError> {
        let path = Self::path(cache_dir);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(DescriptorState::Uninitialized)
            }
            Err(e) => return Err(CacheError::Io { path, source: e }),
        };
        let descriptor =
            serde_json::from_str(&content).map_err(|e| CacheError::DescriptorParse {
                path,
                reason: e.to_string(),
            })?;
        Ok(DescriptorState::Bound(descriptor))
    }

    /// Writes the descriptor into the cache root.
    pub fn save(&self, cache_dir: &Path) -> Result<(), CacheError> {
        let path = Self::path(cache_dir);
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::DescriptorParse {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| CacheError::Io { path, source: e })
    }

    /// Binds `cache_dir` to this configuration.
    ///
    /// On an uninitialized root the descriptor is written. On a bound root
    /// the stored descriptor is compared field by field and the first
    /// disagreement is returned as [`CacheError::ConfigMismatch`], without
    /// touching the filesystem.
    pub fn bind(&self, cache_dir: &Path) -> Result<(), CacheError> {
        match Self::load(cache_dir)? {
            DescriptorState::Uninitialized => {
                self.save(cache_dir)?;
                tracing::info!(
                    cache_dir = %cache_dir.display(),
                    levels = self.levels,
                    codec = %self.codec,
                    hashalgo = %self.hashalgo,
                    "bound cache directory to configuration"
                );
                Ok(())
            }
            DescriptorState::Bound(stored) => stored.check_matches(self),
        }
    }

    /// Compares a stored descriptor against a requested one.
    pub fn check_matches(&self, requested: &CacheDescriptor) -> Result<(), CacheError> {
        if self.levels != requested.levels {
            return Err(CacheError::ConfigMismatch {
                field: "levels",
                stored: self.levels.to_string(),
                requested: requested.levels.to_string(),
            });
        }
        if self.codec != requested.codec {
            return Err(CacheError::ConfigMismatch {
                field: "codec",
                stored: self.codec.clone(),
                requested: requested.codec.clone(),
            });
        }
        if self.hashalgo != requested.hashalgo {
            return Err(CacheError::ConfigMismatch {
                field: "hashalgo",
                stored: self.hashalgo.clone(),
                requested: requested.hashalgo.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md5_json(levels: u8) -> CacheDescriptor {
        CacheDescriptor::new(levels, "json", "md5")
    }

    #[test]
    fn load_missing_is_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            CacheDescriptor::load(dir.path()).unwrap(),
            DescriptorState::Uninitialized
        );
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        md5_json(3).save(dir.path()).unwrap();
        assert_eq!(
            CacheDescriptor::load(dir.path()).unwrap(),
            DescriptorState::Bound(md5_json(3))
        );
    }

    #[test]
    fn file_uses_documented_field_names() {
        let dir = tempfile::tempdir().unwrap();
        md5_json(2).save(dir.path()).unwrap();
        let raw = std::fs::read_to_string(dir.path().join(DESCRIPTOR_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["levels"], 2);
        assert_eq!(value["codec"], "json");
        assert_eq!(value["hashalgo"], "md5");
    }

    #[test]
    fn load_corrupt_json_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DESCRIPTOR_FILE), "not valid json {{{").unwrap();
        let err = CacheDescriptor::load(dir.path()).unwrap_err();
        assert!(matches!(err, CacheError::DescriptorParse { .. }));
    }

    #[test]
    fn bind_writes_once_then_accepts_same() {
        let dir = tempfile::tempdir().unwrap();
        md5_json(2).bind(dir.path()).unwrap();
        assert!(dir.path().join(DESCRIPTOR_FILE).exists());
        md5_json(2).bind(dir.path()).unwrap();
    }

    #[test]
    fn bind_rejects_each_field() {
        let dir = tempfile::tempdir().unwrap();
        md5_json(2).bind(dir.path()).unwrap();

        let cases = [
            (CacheDescriptor::new(3, "json", "md5"), "levels", "2", "3"),
            (CacheDescriptor::new(2, "bincode", "md5"), "codec", "json", "bincode"),
            (CacheDescriptor::new(2, "json", "xxh3"), "hashalgo", "md5", "xxh3"),
        ];
        for (requested, want_field, want_stored, want_requested) in cases {
            match requested.bind(dir.path()).unwrap_err() {
                CacheError::ConfigMismatch {
                    field,
                    stored,
                    requested,
                } => {
                    assert_eq!(field, want_field);
                    assert_eq!(stored, want_stored);
                    assert_eq!(requested, want_requested);
                }
                other => panic!("expected ConfigMismatch, got {other:?}"),
            }
        }
    }

    #[test]
    fn mismatch_leaves_descriptor_untouched() {
        let dir = tempfile::tempdir().unwrap();
        md5_json(3).bind(dir.path()).unwrap();
        let before = std::fs::read(dir.path().join(DESCRIPTOR_FILE)).unwrap();
        assert!(md5_json(2).bind(dir.path()).is_err());
        let after = std::fs::read(dir.path().join(DESCRIPTOR_FILE)).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn levels_checked_before_codec() {
        let stored = md5_json(3);
        let err = stored
            .check_matches(&CacheDescriptor::new(2, "bincode", "xxh3"))
            .unwrap_err();
        assert!(matches!(err, CacheError::ConfigMismatch { field: "levels", .. }));
    }
}
