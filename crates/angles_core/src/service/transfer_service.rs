//! Export and import of whole catalogs.
//!
//! # Responsibility
//! - Write the current snapshot as an `AnglesProto` export envelope.
//! - Run imported bytes through parse, migrate, quota check, backup and
//!   replace, in that order.
//!
//! # Invariants
//! - An import that fails to parse or exceeds the quota changes nothing.
//! - Exactly one backup push is attempted per accepted import; its failure
//!   does not block the import.

use crate::clock::Clock;
use crate::migrate::migrate;
use crate::model::snapshot::ExportEnvelope;
use crate::storage::KvStorage;
use crate::store::{CapacityError, Store, StoreError};
use log::{info, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Debug)]
pub enum ImportError {
    /// The file is not valid JSON (or not UTF-8).
    Parse(serde_json::Error),
    Capacity(CapacityError),
    Store(StoreError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "import file is not valid JSON: {err}"),
            Self::Capacity(err) => write!(f, "import rejected: {err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Capacity(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for ImportError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Capacity(err) => Self::Capacity(err),
            other => Self::Store(other),
        }
    }
}

/// Summary of an accepted import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub holds: usize,
    pub angles: usize,
    pub cover_images: usize,
    /// Whether the pre-import backup was persisted.
    pub backup_written: bool,
}

pub struct TransferService<'s, S: KvStorage, C: Clock> {
    store: &'s mut Store<S, C>,
}

impl<'s, S: KvStorage, C: Clock> TransferService<'s, S, C> {
    pub fn new(store: &'s mut Store<S, C>) -> Self {
        Self { store }
    }

    /// Renders the current snapshot as a pretty-printed export document.
    pub fn export_document(&self) -> Result<String, StoreError> {
        let exported_at = format_timestamp(self.store.clock().now_ms());
        let envelope = ExportEnvelope::new(exported_at, self.store.snapshot());
        let text = serde_json::to_string_pretty(&envelope)?;
        info!(
            "event=export module=transfer status=ok bytes={}",
            text.len()
        );
        Ok(text)
    }

    /// Imports an export envelope or bare snapshot document.
    ///
    /// # Errors
    /// - `ImportError::Parse` when `bytes` is not JSON.
    /// - `ImportError::Capacity` when the migrated catalog exceeds the quota.
    pub fn import_document(&mut self, bytes: &[u8]) -> Result<ImportReport, ImportError> {
        let document = serde_json::from_slice::<Value>(bytes).map_err(|err| {
            warn!("event=import module=transfer status=error error_code=parse_failed");
            ImportError::Parse(err)
        })?;

        let candidate = migrate(&document);
        let backup_written = self.store.replace_with_backup(&candidate)?;
        let snapshot = self.store.snapshot();
        let report = ImportReport {
            holds: snapshot.holds.len(),
            angles: snapshot.angles.len(),
            cover_images: snapshot.hold_images.len(),
            backup_written,
        };
        info!(
            "event=import module=transfer status=ok bytes={} holds={} angles={} cover_images={} backup_written={}",
            bytes.len(),
            report.holds,
            report.angles,
            report.cover_images,
            report.backup_written
        );
        Ok(report)
    }
}

/// Formats epoch milliseconds as RFC 3339; out-of-range input falls back to
/// the epoch.
pub fn format_timestamp(epoch_ms: i64) -> String {
    let nanos = i128::from(epoch_ms) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
