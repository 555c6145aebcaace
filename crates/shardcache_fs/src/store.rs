//! The sharded filesystem store.
//!
//! [`ShardedFileStore`] hashes each key, derives the entry's shard directory
//! from the digest, and delegates payload (de)serialization to its codec.
//! The configuration descriptor is consulted only when the store is opened.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use shardcache_common::{Codec, HashAlgorithm, JsonCodec, KeyValueCache, Md5Hash};

use crate::descriptor::{CacheDescriptor, DESCRIPTOR_FILE};
use crate::error::CacheError;
use crate::shard::{ShardPath, DEFAULT_LEVELS, MAX_LEVELS};

/// A key-value cache persisted as one file per entry under a sharded tree.
///
/// The store exclusively owns the directory tree under its root. Concurrent
/// writers are not coordinated; each operation is a handful of blocking
/// filesystem calls on the calling thread.
#[derive(Debug)]
pub struct ShardedFileStore<H = Md5Hash, C = JsonCodec> {
    /// Root directory for all cache files.
    cache_dir: PathBuf,

    /// Number of shard directories between the root and an entry.
    levels: u8,

    /// Key hashing strategy.
    hash: H,

    /// Entry payload codec.
    codec: C,
}

impl ShardedFileStore {
    /// Opens a store with two shard levels, MD5 key hashing and JSON payloads.
    pub fn with_defaults(cache_dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        Self::open(cache_dir, DEFAULT_LEVELS, Md5Hash, JsonCodec)
    }
}

impl<H: HashAlgorithm, C: Codec> ShardedFileStore<H, C> {
    /// Opens the store rooted at `cache_dir`, creating the directory if needed.
    ///
    /// The first open of a directory records `levels` and the identifiers of
    /// `hash` and `codec` in its descriptor. Later opens must request the same
    /// three values or fail with [`CacheError::ConfigMismatch`].
    pub fn open(
        cache_dir: impl AsRef<Path>,
        levels: u8,
        hash: H,
        codec: C,
    ) -> Result<Self, CacheError> {
        if levels > MAX_LEVELS {
            return Err(CacheError::InvalidLevels {
                levels,
                max: MAX_LEVELS,
            });
        }

        let cache_dir = cache_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&cache_dir).map_err(|e| CacheError::DirectoryInit {
            path: cache_dir.clone(),
            source: e,
        })?;

        let store = Self {
            cache_dir,
            levels,
            hash,
            codec,
        };
        store.descriptor().bind(&store.cache_dir)?;
        Ok(store)
    }

    /// Returns the cache root directory.
    pub fn cache_path(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the configured shard depth.
    pub fn levels(&self) -> u8 {
        self.levels
    }

    /// Returns the key hashing strategy.
    pub fn hash_algorithm(&self) -> &H {
        &self.hash
    }

    /// Returns the payload codec.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Returns the configuration this store is bound to.
    pub fn descriptor(&self) -> CacheDescriptor {
        CacheDescriptor::new(self.levels, self.codec.id(), self.hash.id())
    }

    /// Computes the digest naming the entry for `key`.
    pub fn digest(&self, key: &str) -> String {
        self.hash.hash(key.as_bytes())
    }

    /// Returns the file path the entry for `key` is stored at.
    ///
    /// The digest and each shard segment must be a plain file name, so every
    /// entry path stays below the cache root whatever the hash algorithm
    /// returns.
    pub fn entry_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        let digest = self.digest(key);
        if digest.is_empty() {
            return Err(CacheError::EmptyDigest {
                key: key.to_string(),
            });
        }
        let shard = ShardPath::from_digest(&digest, self.levels);
        if !is_plain_name(&digest) || !shard.segments().iter().all(|s| is_plain_name(s)) {
            return Err(CacheError::InvalidDigest {
                key: key.to_string(),
                digest,
            });
        }
        Ok(self.cache_dir.join(shard.to_relative_path()).join(digest))
    }

    /// Like [`entry_path`](Self::entry_path), but `None` for a key whose
    /// digest is empty, since no entry can exist for it.
    fn lookup_path(&self, key: &str) -> Result<Option<PathBuf>, CacheError> {
        match self.entry_path(key) {
            Ok(path) => Ok(Some(path)),
            Err(CacheError::EmptyDigest { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Stores `value` under `key` and returns the path of the entry file.
    ///
    /// An existing entry is removed before the new payload is written.
    pub fn set<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
    ) -> Result<PathBuf, CacheError> {
        let path = self.entry_path(key)?;
        let payload = self.codec.encode(value)?;

        if let Some(shard_dir) = path.parent() {
            std::fs::create_dir_all(shard_dir).map_err(|e| CacheError::DirectoryInit {
                path: shard_dir.to_path_buf(),
                source: e,
            })?;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(CacheError::Io { path, source: e }),
        }

        std::fs::write(&path, &payload).map_err(|e| CacheError::Io {
            path: path.clone(),
            source: e,
        })?;

        tracing::debug!(key, path = %path.display(), bytes = payload.len(), "cache set");
        Ok(path)
    }

    /// Returns `true` if an entry file exists for `key`.
    ///
    /// The payload is not read or decoded.
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let Some(path) = self.lookup_path(key)? else {
            return Ok(false);
        };
        match std::fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io { path, source: e }),
        }
    }

    /// Returns the value stored under `key`, or `None` if there is no entry.
    ///
    /// A payload that cannot be decoded is reported as [`CacheError::Codec`].
    pub fn get<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>, CacheError> {
        let Some(path) = self.lookup_path(key)? else {
            return Ok(None);
        };
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Io { path, source: e }),
        };
        Ok(Some(self.codec.decode(&bytes)?))
    }

    /// Removes the entry for `key`.
    ///
    /// Fails with [`CacheError::EntryNotFound`] if there is no entry; check
    /// [`exists`](Self::exists) first for idempotent deletion.
    pub fn unset(&self, key: &str) -> Result<(), CacheError> {
        let path = self.entry_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(key, path = %path.display(), "cache unset");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::EntryNotFound {
                key: key.to_string(),
                path,
            }),
            Err(e) => Err(CacheError::Io { path, source: e }),
        }
    }

    /// Returns the value stored under `key` and removes its entry.
    ///
    /// Returns `None`, removing nothing, if there is no entry.
    pub fn pop<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>, CacheError> {
        let Some(value) = self.get(key)? else {
            return Ok(None);
        };
        self.unset(key)?;
        Ok(Some(value))
    }

    /// Removes every entry and shard directory, keeping the descriptor.
    ///
    /// The store stays bound to the same configuration and can be used
    /// again immediately.
    pub fn clear_cache(&self) -> Result<(), CacheError> {
        let entries = std::fs::read_dir(&self.cache_dir).map_err(io_err(&self.cache_dir))?;
        let mut removed = 0usize;
        for entry in entries {
            let entry = entry.map_err(io_err(&self.cache_dir))?;
            if entry.file_name() == DESCRIPTOR_FILE {
                continue;
            }
            let path = entry.path();
            let file_type = entry.file_type().map_err(io_err(&path))?;
            if file_type.is_dir() {
                std::fs::remove_dir_all(&path).map_err(io_err(&path))?;
            } else {
                std::fs::remove_file(&path).map_err(io_err(&path))?;
            }
            removed += 1;
        }

        tracing::debug!(cache_dir = %self.cache_dir.display(), removed, "cache cleared");
        Ok(())
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> CacheError {
    let path = path.to_path_buf();
    move |source| CacheError::Io { path, source }
}

impl<H: HashAlgorithm, C: Codec> KeyValueCache for ShardedFileStore<H, C> {
    type Error = CacheError;

    fn set<V: Serialize + ?Sized>(&mut self, key: &str, value: &V) -> Result<(), CacheError> {
        ShardedFileStore::set(self, key, value).map(|_| ())
    }

    fn get<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>, CacheError> {
        ShardedFileStore::get(self, key)
    }

    fn exists(&self, key: &str) -> Result<bool, CacheError> {
        ShardedFileStore::exists(self, key)
    }

    fn unset(&mut self, key: &str) -> Result<(), CacheError> {
        ShardedFileStore::unset(self, key)
    }
}
