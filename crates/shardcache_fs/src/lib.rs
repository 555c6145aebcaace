//! Sharded filesystem key-value cache.
//!
//! Values are encoded with a pluggable [`Codec`](shardcache_common::Codec) and
//! written to files named by the hashed key, spread over a fixed-depth tree of
//! two-character directories. A `cache_config` descriptor in the cache root
//! binds the tree to one shard depth, codec and hash algorithm for its whole
//! lifetime.

#![warn(missing_docs)]

pub mod descriptor;
pub mod error;
pub mod shard;
pub mod store;

pub use descriptor::{CacheDescriptor, DescriptorState, DESCRIPTOR_FILE};
pub use error::CacheError;
pub use shard::{ShardPath, DEFAULT_LEVELS, FILLER, MAX_LEVELS};
pub use store::ShardedFileStore;
