//! Configuration file loading and validation.

use std::path::Path;

use crate::error::ConfigError;
use crate::types::{ShardcacheConfig, MAX_LEVELS};

/// Name of the configuration file within a project directory.
pub const CONFIG_FILE: &str = "shardcache.toml";

/// Loads and validates a `shardcache.toml` configuration from a directory.
///
/// Relative store paths are resolved against `dir`.
pub fn load_config(dir: &Path) -> Result<ShardcacheConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    let content =
        std::fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })?;
    let mut config = load_config_from_str(&content)?;
    if let Some(cache) = config.cache.as_mut() {
        if cache.cache_path.is_relative() {
            cache.cache_path = dir.join(&cache.cache_path);
        }
    }
    if let Some(sqlite) = config.sqlite.as_mut() {
        if sqlite.cache_path.is_relative() {
            sqlite.cache_path = dir.join(&sqlite.cache_path);
        }
    }
    Ok(config)
}

/// Parses and validates a `shardcache.toml` configuration from a string.
///
/// Paths are returned exactly as written.
pub fn load_config_from_str(content: &str) -> Result<ShardcacheConfig, ConfigError> {
    let config: ShardcacheConfig = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ShardcacheConfig) -> Result<(), ConfigError> {
    if config.cache.is_none() && config.sqlite.is_none() {
        return Err(ConfigError::NoStore);
    }
    if let Some(cache) = &config.cache {
        if cache.cache_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath { key: "cache.path" });
        }
        if cache.levels > MAX_LEVELS {
            return Err(ConfigError::LevelsOutOfRange {
                levels: cache.levels,
                max: MAX_LEVELS,
            });
        }
    }
    if let Some(sqlite) = &config.sqlite {
        if sqlite.cache_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath { key: "sqlite.path" });
        }
    }
    Ok(())
}
