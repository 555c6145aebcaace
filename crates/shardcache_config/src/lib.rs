//! Parsing and validation of `shardcache.toml` store configuration files.
//!
//! This crate reads the configuration file and produces strongly-typed
//! [`StoreOptions`] and [`SqliteOptions`] that the store crates open from.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
