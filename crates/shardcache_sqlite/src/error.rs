//! Error types for the SQLite store.

use std::path::PathBuf;

use shardcache_common::CodecError;

/// Errors that can occur while opening or using a [`RelationalStore`](crate::RelationalStore).
#[derive(Debug, thiserror::Error)]
pub enum SqliteCacheError {
    /// The cache root directory could not be created.
    #[error("could not initialize cache directory {path}: {source}")]
    DirectoryInit {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An existing database file could not be removed on reset.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The database engine reported an error.
    #[error("cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A row payload could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// `unset` targeted a key that has no row.
    #[error("no cache entry for key '{key}'")]
    EntryNotFound {
        /// The cache key.
        key: String,
    },

    /// An import was started twice, or ended without being started.
    #[error("invalid import state: {reason}")]
    ImportState {
        /// What was wrong.
        reason: &'static str,
    },
}
