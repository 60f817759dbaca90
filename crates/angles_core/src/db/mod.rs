//! SQLite bootstrap for the durable key/value backend.
//!
//! # Responsibility
//! - Open and configure SQLite connections used by `storage::SqliteStorage`.
//! - Apply backend schema migrations in deterministic order.
//!
//! # Invariants
//! - Backend schema version is tracked via `PRAGMA user_version`.
//! - Snapshot documents are never read or written before migrations succeed.
//! - The backend schema version is unrelated to the snapshot schema version.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failures of the SQLite key/value backend, tagged with the step that failed.
#[derive(Debug)]
pub enum DbError {
    /// Opening or configuring the connection (`mode` is `file` or `memory`).
    Connect {
        mode: &'static str,
        source: rusqlite::Error,
    },
    /// Reading the schema version or applying migration `version`.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// Reading or writing the `kv_entries` row for `key`.
    Entry {
        key: String,
        source: rusqlite::Error,
    },
    /// The database was migrated by a newer build.
    NewerSchema { found: u32, supported: u32 },
}

impl DbError {
    /// Stable identifier used as `error_code` in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "db_connect_failed",
            Self::Migration { .. } => "db_migration_failed",
            Self::Entry { .. } => "db_entry_failed",
            Self::NewerSchema { .. } => "db_schema_newer",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect { mode, source } => {
                write!(f, "cannot open {mode} storage database: {source}")
            }
            Self::Migration { version, source } => {
                write!(f, "storage schema migration {version} failed: {source}")
            }
            Self::Entry { key, source } => {
                write!(f, "storage entry `{key}` failed: {source}")
            }
            Self::NewerSchema { found, supported } => write!(
                f,
                "storage database version {found} is newer than supported {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connect { source, .. }
            | Self::Migration { source, .. }
            | Self::Entry { source, .. } => Some(source),
            Self::NewerSchema { .. } => None,
        }
    }
}
