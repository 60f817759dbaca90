//! Persistence store and its write path collaborators.
//!
//! # Responsibility
//! - Own the single in-memory canonical snapshot (`persistence`).
//! - Coalesce mutations into debounced durable writes (`scheduler`).
//! - Keep a bounded ring of pre-import backups (`backup`).
//! - Refuse snapshots that would overflow the storage budget (`quota`).
//!
//! # Invariants
//! - The durable snapshot slot is written only by the store's flush path and
//!   the load-time self-heal.
//! - Every snapshot entering the store went through `migrate::migrate`.

use crate::config::ConfigError;
use crate::storage::StorageError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod backup;
pub mod persistence;
pub mod quota;
pub mod scheduler;

pub use backup::BackupRing;
pub use persistence::{FlushOutcome, Store};
pub use quota::{CapacityError, QuotaGuard};
pub use scheduler::{PendingWrite, SchedulerState, WriteScheduler};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Config(ConfigError),
    Capacity(CapacityError),
    Storage(StorageError),
    Serialize(serde_json::Error),
    BackupNotFound(usize),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Capacity(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to serialize snapshot: {err}"),
            Self::BackupNotFound(index) => write!(f, "backup not found at index {index}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Capacity(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::BackupNotFound(_) => None,
        }
    }
}

impl From<ConfigError> for StoreError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<CapacityError> for StoreError {
    fn from(value: CapacityError) -> Self {
        Self::Capacity(value)
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}
