//! Bounded backup ring.
//!
//! # Invariants
//! - Entries are ordered newest first.
//! - The persisted ring never holds more than `limit` entries.
//! - Entries read back are re-migrated; unreadable entries are skipped.

use crate::migrate::migrate;
use crate::model::snapshot::{BackupEntry, CanonicalSnapshot};
use crate::storage::KvStorage;
use crate::store::StoreResult;
use log::{info, warn};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRing {
    key: String,
    limit: usize,
}

impl BackupRing {
    pub fn new(key: impl Into<String>, limit: usize) -> Self {
        Self {
            key: key.into(),
            limit,
        }
    }

    /// Reads the persisted ring, newest first.
    ///
    /// A missing or corrupt ring reads as empty.
    pub fn entries<S: KvStorage>(&self, storage: &S) -> StoreResult<Vec<BackupEntry>> {
        let Some(text) = storage.get(&self.key)? else {
            return Ok(Vec::new());
        };
        let items = match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => items,
            Ok(_) | Err(_) => {
                warn!(
                    "event=backup_read module=backup status=error error_code=backup_ring_corrupt"
                );
                return Ok(Vec::new());
            }
        };

        Ok(items.iter().filter_map(parse_entry).collect())
    }

    /// Prepends a backup of `snapshot`, truncates to the limit and persists.
    ///
    /// Returns the ring length after the push.
    pub fn push_backup<S: KvStorage>(
        &self,
        storage: &mut S,
        snapshot: &CanonicalSnapshot,
        timestamp: i64,
    ) -> StoreResult<usize> {
        let mut entries = self.entries(storage)?;
        entries.insert(
            0,
            BackupEntry {
                timestamp,
                snapshot: snapshot.clone(),
            },
        );
        entries.truncate(self.limit);

        let payload = serde_json::to_string(&entries)?;
        storage.set(&self.key, &payload)?;
        info!(
            "event=backup_push module=backup status=ok entries={} bytes={}",
            entries.len(),
            payload.len()
        );
        Ok(entries.len())
    }
}

fn parse_entry(item: &Value) -> Option<BackupEntry> {
    let object = item.as_object()?;
    let timestamp = object.get("timestamp")?.as_i64()?;
    let snapshot = migrate(object.get("snapshot")?);
    Some(BackupEntry {
        timestamp,
        snapshot,
    })
}
