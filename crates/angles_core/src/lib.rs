//! Core persistence and data-integrity layer for the Angles catalog.
//! This crate is the single source of truth for catalog invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod migrate;
pub mod model;
pub mod sanitize;
pub mod service;
pub mod storage;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use migrate::migrate;
pub use model::angle::{Angle, AngleCategory, AngleId};
pub use model::snapshot::{BackupEntry, CanonicalSnapshot, ExportEnvelope, SCHEMA_VERSION};
pub use service::catalog_service::{CatalogError, CatalogResult, CatalogService};
pub use service::transfer_service::{ImportError, ImportReport, TransferService};
pub use storage::{KvStorage, MemoryStorage, SqliteStorage, StorageError, StorageResult};
pub use store::{CapacityError, FlushOutcome, Store, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
