//! The SQLite store.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shardcache_common::{BincodeCodec, Codec, KeyValueCache};

use crate::error::SqliteCacheError;

/// Name of the database file within the cache root.
pub const DATABASE_FILE: &str = "cache.db";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS cache (
    key TEXT PRIMARY KEY NOT NULL,
    value BLOB NOT NULL
);";

const UPSERT: &str = "INSERT OR REPLACE INTO cache (key, value) VALUES (?1, ?2)";
const SELECT: &str = "SELECT value FROM cache WHERE key = ?1";
const DELETE: &str = "DELETE FROM cache WHERE key = ?1";

/// A key-value cache stored as rows of an embedded SQLite table.
///
/// Rows are keyed by the raw cache key. Outside an import every write is
/// its own transaction; wrap bulk loads in
/// [`start_import`](Self::start_import) / [`end_import`](Self::end_import).
#[derive(Debug)]
pub struct RelationalStore<C = BincodeCodec> {
    /// Directory holding the database file.
    cache_dir: PathBuf,

    /// Open database handle.
    conn: Connection,

    /// Row payload codec.
    codec: C,
}

impl RelationalStore {
    /// Opens a store with binary payloads.
    pub fn with_defaults(
        cache_dir: impl AsRef<Path>,
        reset: bool,
    ) -> Result<Self, SqliteCacheError> {
        Self::open(cache_dir, reset, BincodeCodec)
    }
}

impl<C: Codec> RelationalStore<C> {
    /// Opens `<cache_dir>/cache.db`, creating the directory and schema if needed.
    ///
    /// With `reset`, an existing database file is deleted first.
    pub fn open(
        cache_dir: impl AsRef<Path>,
        reset: bool,
        codec: C,
    ) -> Result<Self, SqliteCacheError> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&cache_dir).map_err(|e| SqliteCacheError::DirectoryInit {
            path: cache_dir.clone(),
            source: e,
        })?;

        let db_path = cache_dir.join(DATABASE_FILE);
        if reset {
            match std::fs::remove_file(&db_path) {
                Ok(()) => tracing::debug!(path = %db_path.display(), "removed cache database"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(SqliteCacheError::Io {
                        path: db_path,
                        source: e,
                    })
                }
            }
        }

        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "synchronous", "OFF")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update_and_check(None, "journal_mode", "MEMORY", |row| {
            row.get::<_, String>(0)
        })?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            cache_dir,
            conn,
            codec,
        })
    }

    /// Returns the directory holding the database file.
    pub fn cache_path(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the payload codec.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Stores `value` under `key`, replacing any existing row.
    pub fn set<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
    ) -> Result<(), SqliteCacheError> {
        let payload = self.codec.encode(value)?;
        self.conn
            .prepare_cached(UPSERT)?
            .execute(params![key, payload])?;
        tracing::debug!(key, bytes = payload.len(), "cache set");
        Ok(())
    }

    /// Returns `true` if a row exists for `key`.
    pub fn exists(&self, key: &str) -> Result<bool, SqliteCacheError> {
        Ok(fetch(&self.conn, key)?.is_some())
    }

    /// Returns the value stored under `key`, or `None` if there is no row.
    pub fn get<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>, SqliteCacheError> {
        match fetch(&self.conn, key)? {
            Some(bytes) => Ok(Some(self.codec.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Removes the row for `key`.
    ///
    /// Fails with [`SqliteCacheError::EntryNotFound`] if there is no row.
    pub fn unset(&self, key: &str) -> Result<(), SqliteCacheError> {
        if delete(&self.conn, key)? == 0 {
            return Err(SqliteCacheError::EntryNotFound {
                key: key.to_string(),
            });
        }
        tracing::debug!(key, "cache unset");
        Ok(())
    }

    /// Returns the value stored under `key` and deletes its row.
    ///
    /// The read and the delete run under one savepoint, so they also nest
    /// inside an open import. Returns `None` if there is no row. A payload
    /// that fails to decode is left in place.
    pub fn pop<V: DeserializeOwned>(
        &mut self,
        key: &str,
    ) -> Result<Option<V>, SqliteCacheError> {
        let sp = self.conn.savepoint()?;
        let Some(bytes) = fetch(&sp, key)? else {
            return Ok(None);
        };
        let value = self.codec.decode(&bytes)?;
        delete(&sp, key)?;
        sp.commit()?;
        tracing::debug!(key, "cache pop");
        Ok(Some(value))
    }

    /// Opens a transaction covering every write until [`end_import`](Self::end_import).
    pub fn start_import(&mut self) -> Result<&mut Self, SqliteCacheError> {
        if !self.conn.is_autocommit() {
            return Err(SqliteCacheError::ImportState {
                reason: "an import is already in progress",
            });
        }
        self.conn.execute_batch("BEGIN TRANSACTION;")?;
        tracing::debug!(cache_dir = %self.cache_dir.display(), "import started");
        Ok(self)
    }

    /// Commits the transaction opened by [`start_import`](Self::start_import).
    pub fn end_import(&mut self) -> Result<&mut Self, SqliteCacheError> {
        self.finish_import("COMMIT;")?;
        tracing::debug!(cache_dir = %self.cache_dir.display(), "import committed");
        Ok(self)
    }

    /// Discards every write made since [`start_import`](Self::start_import).
    pub fn abort_import(&mut self) -> Result<&mut Self, SqliteCacheError> {
        self.finish_import("ROLLBACK;")?;
        tracing::debug!(cache_dir = %self.cache_dir.display(), "import rolled back");
        Ok(self)
    }

    /// Returns `true` while an import transaction is open.
    pub fn is_importing(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Number of rows in the cache.
    pub fn len(&self) -> Result<usize, SqliteCacheError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cache", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Returns `true` if the cache holds no rows.
    pub fn is_empty(&self) -> Result<bool, SqliteCacheError> {
        Ok(self.len()? == 0)
    }

    /// Deletes every row, keeping the schema.
    pub fn clear_cache(&self) -> Result<(), SqliteCacheError> {
        let removed = self.conn.execute("DELETE FROM cache", [])?;
        tracing::debug!(removed, "cache cleared");
        Ok(())
    }

    fn finish_import(&mut self, sql: &str) -> Result<(), SqliteCacheError> {
        if self.conn.is_autocommit() {
            return Err(SqliteCacheError::ImportState {
                reason: "no import in progress",
            });
        }
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

impl<C: Codec> KeyValueCache for RelationalStore<C> {
    type Error = SqliteCacheError;

    fn set<V: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &V,
    ) -> Result<(), SqliteCacheError> {
        RelationalStore::set(self, key, value)
    }

    fn get<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>, SqliteCacheError> {
        RelationalStore::get(self, key)
    }

    fn exists(&self, key: &str) -> Result<bool, SqliteCacheError> {
        RelationalStore::exists(self, key)
    }

    fn unset(&mut self, key: &str) -> Result<(), SqliteCacheError> {
        RelationalStore::unset(self, key)
    }
}

fn fetch(conn: &Connection, key: &str) -> rusqlite::Result<Option<Vec<u8>>> {
    conn.prepare_cached(SELECT)?
        .query_row(params![key], |row| row.get(0))
        .optional()
}

fn delete(conn: &Connection, key: &str) -> rusqlite::Result<usize> {
    conn.prepare_cached(DELETE)?.execute(params![key])
}
