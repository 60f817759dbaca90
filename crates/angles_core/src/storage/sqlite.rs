//! SQLite-backed storage backend.
//!
//! # Invariants
//! - Each key maps to at most one row in `kv_entries`.
//! - `SQLITE_FULL` surfaces as `StorageError::QuotaExceeded`.

use super::{KvStorage, StorageError, StorageResult};
use crate::db::{open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KvStorage for SqliteStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|source| entry_error(key, source))?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.conn
            .execute(
                "INSERT INTO kv_entries (key, value, updated_at)
                 VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at;",
                params![key, value],
            )
            .map_err(|err| match err.sqlite_error_code() {
                Some(ErrorCode::DiskFull) => StorageError::QuotaExceeded {
                    key: key.to_string(),
                    attempted_bytes: value.len(),
                },
                _ => entry_error(key, err),
            })?;
        Ok(())
    }
}

fn entry_error(key: &str, source: rusqlite::Error) -> StorageError {
    StorageError::Db(DbError::Entry {
        key: key.to_string(),
        source,
    })
}
