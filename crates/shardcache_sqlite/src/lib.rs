//! SQLite-backed key-value cache.
//!
//! [`RelationalStore`] offers the same associative contract as the sharded
//! file store, keeping every entry as a row of a single `cache` table inside
//! `<root>/cache.db`. It adds explicit import transactions for bulk loading
//! and an atomic read-then-delete [`pop`](RelationalStore::pop).

#![warn(missing_docs)]

pub mod error;
pub mod store;

pub use error::SqliteCacheError;
pub use store::{RelationalStore, DATABASE_FILE};
