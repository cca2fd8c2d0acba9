//! SQLite-backed key-value store.
//!
//! A single `kv` table holds the group catalog, settings and the in-flight
//! timer checkpoint as JSON strings.

use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use super::store::KeyValueStore;
use crate::error::StoreError;

/// Default database file name inside the data directory.
pub const DEFAULT_DATABASE_FILE: &str = "routimer.db";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open `<data_dir>/<file_name>`, creating the file and schema if needed.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open(file_name: &str) -> Result<Self, StoreError> {
        let path = data_dir()?.join(file_name);
        Self::open_path(&path)
    }

    /// Open a database at an explicit path.
    pub fn open_path(path: &std::path::Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}
