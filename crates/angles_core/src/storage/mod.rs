//! Durable key/value storage abstraction.
//!
//! # Responsibility
//! - Define the single-slot-per-key storage contract the store writes through.
//! - Provide an in-memory backend and a SQLite-backed backend.
//!
//! # Invariants
//! - Backends store opaque UTF-8 strings; they never interpret snapshots.
//! - A failed `set` leaves the previous value for that key in place.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by durable storage backends.
#[derive(Debug)]
pub enum StorageError {
    /// The host refused the write because its quota is exhausted.
    QuotaExceeded { key: String, attempted_bytes: usize },
    /// The backend could not be reached for `key`.
    Unavailable { key: String, reason: String },
    Db(DbError),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuotaExceeded {
                key,
                attempted_bytes,
            } => write!(
                f,
                "storage quota exceeded while writing {attempted_bytes} bytes to `{key}`"
            ),
            Self::Unavailable { key, reason } => {
                write!(f, "storage unavailable for `{key}`: {reason}")
            }
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::QuotaExceeded { .. } | Self::Unavailable { .. } => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Size-constrained key/value storage, one string value per key.
pub trait KvStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;
}

impl<T: KvStorage + ?Sized> KvStorage for Box<T> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }
}
