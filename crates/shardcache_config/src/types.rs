//! Configuration types deserialized from `shardcache.toml`.

use std::path::PathBuf;

use serde::Deserialize;
use shardcache_common::{CodecKind, HashKind};
use shardcache_fs::{CacheError, ShardedFileStore};
use shardcache_sqlite::{RelationalStore, SqliteCacheError};

pub use shardcache_fs::{DEFAULT_LEVELS, MAX_LEVELS};

/// The top-level configuration parsed from `shardcache.toml`.
///
/// At least one of the two store sections must be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShardcacheConfig {
    /// Sharded filesystem store settings.
    #[serde(default)]
    pub cache: Option<StoreOptions>,
    /// Embedded SQLite store settings.
    #[serde(default)]
    pub sqlite: Option<SqliteOptions>,
}

/// Options for opening a sharded filesystem store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreOptions {
    /// Root directory of the cache tree.
    #[serde(rename = "path")]
    pub cache_path: PathBuf,
    /// Number of two-character directory levels between the root and an entry.
    #[serde(default = "default_levels")]
    pub levels: u8,
    /// Key hashing strategy.
    #[serde(default)]
    pub hash: HashKind,
    /// Payload codec.
    #[serde(default)]
    pub codec: CodecKind,
}

impl StoreOptions {
    /// Options for `cache_path` with every other setting at its default.
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            levels: DEFAULT_LEVELS,
            hash: HashKind::default(),
            codec: CodecKind::default(),
        }
    }

    /// Sets the shard depth.
    pub fn levels(mut self, levels: u8) -> Self {
        self.levels = levels;
        self
    }

    /// Sets the hashing strategy.
    pub fn hash(mut self, hash: HashKind) -> Self {
        self.hash = hash;
        self
    }

    /// Sets the payload codec.
    pub fn codec(mut self, codec: CodecKind) -> Self {
        self.codec = codec;
        self
    }

    /// Opens the file store these options describe.
    pub fn open(&self) -> Result<ShardedFileStore<HashKind, CodecKind>, CacheError> {
        ShardedFileStore::open(&self.cache_path, self.levels, self.hash, self.codec)
    }
}

/// Options for opening an embedded SQLite store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteOptions {
    /// Directory holding the `cache.db` file.
    #[serde(rename = "path")]
    pub cache_path: PathBuf,
    /// Delete any existing database file before opening.
    #[serde(default)]
    pub reset: bool,
    /// Payload codec.
    #[serde(default = "default_sqlite_codec")]
    pub codec: CodecKind,
}

impl SqliteOptions {
    /// Options for `cache_path`, keeping existing data, with the binary codec.
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            reset: false,
            codec: default_sqlite_codec(),
        }
    }

    /// Sets whether an existing database is discarded on open.
    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Sets the payload codec.
    pub fn codec(mut self, codec: CodecKind) -> Self {
        self.codec = codec;
        self
    }

    /// Opens the SQLite store these options describe.
    pub fn open(&self) -> Result<RelationalStore<CodecKind>, SqliteCacheError> {
        RelationalStore::open(&self.cache_path, self.reset, self.codec)
    }
}

fn default_levels() -> u8 {
    DEFAULT_LEVELS
}

fn default_sqlite_codec() -> CodecKind {
    CodecKind::Bincode
}
