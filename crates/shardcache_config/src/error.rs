//! Errors raised while reading a `shardcache.toml` file.

use std::path::PathBuf;

/// A `shardcache.toml` file could not be read or describes no usable store.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// The configuration file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or a value has the wrong type.
    #[error("malformed shardcache.toml: {0}")]
    Malformed(#[from] toml::de::Error),

    /// Neither a `[cache]` nor a `[sqlite]` table is present.
    #[error("shardcache.toml defines no [cache] or [sqlite] table")]
    NoStore,

    /// A store table has an empty `path`.
    #[error("shardcache.toml key `{key}` must name a directory")]
    EmptyPath {
        /// The offending key, `cache.path` or `sqlite.path`.
        key: &'static str,
    },

    /// `cache.levels` asks for a deeper tree than the file store supports.
    #[error("shardcache.toml key `cache.levels` is {levels}, at most {max} is supported")]
    LevelsOutOfRange {
        /// The configured depth.
        levels: u8,
        /// The deepest supported tree.
        max: u8,
    },
}
