//! The associative contract shared by every storage backend.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A persistent map from string keys to serializable values.
///
/// A missing key is a normal outcome for [`get`](KeyValueCache::get) and
/// [`exists`](KeyValueCache::exists), but an error for
/// [`unset`](KeyValueCache::unset).
pub trait KeyValueCache {
    /// Error type returned by every operation.
    type Error: std::error::Error;

    /// Stores `value` under `key`, replacing any previous value.
    fn set<V: Serialize + ?Sized>(&mut self, key: &str, value: &V) -> Result<(), Self::Error>;

    /// Returns the value stored under `key`, or `None` if there is none.
    fn get<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>, Self::Error>;

    /// Returns `true` if a value is stored under `key`.
    fn exists(&self, key: &str) -> Result<bool, Self::Error>;

    /// Removes the value stored under `key`.
    ///
    /// Fails if there is no such value.
    fn unset(&mut self, key: &str) -> Result<(), Self::Error>;
}
