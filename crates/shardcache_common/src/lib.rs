//! Shared building blocks for the shardcache stores.
//!
//! This crate provides the hashing and payload-encoding strategies that a
//! cache store is composed from, the registry enums that name them in
//! configuration files and persisted descriptors, and the associative
//! [`KeyValueCache`] contract every storage backend implements.

#![warn(missing_docs)]

pub mod codec;
pub mod contract;
pub mod hash;

pub use codec::{BincodeCodec, Codec, CodecError, CodecKind, JsonCodec};
pub use contract::KeyValueCache;
pub use hash::{HashAlgorithm, HashKind, HexString, Md5Hash, UnknownStrategy, Xxh3Hash};
