//! In-memory storage backend.
//!
//! Mirrors a browser-style storage area: a flat string map with an optional
//! total byte capacity. Write counters and read failure injection make the
//! store's write behavior observable in tests.

use super::{KvStorage, StorageError, StorageResult};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
    capacity_bytes: Option<usize>,
    write_counts: BTreeMap<String, usize>,
    failing_reads: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the total size of all keys plus values, like a host quota.
    pub fn with_capacity(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes: Some(capacity_bytes),
            ..Self::default()
        }
    }

    /// Seeds one raw entry without counting it as a write.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Makes every subsequent `get` fail.
    pub fn with_failing_reads(mut self) -> Self {
        self.failing_reads = true;
        self
    }

    /// Returns the raw stored value without going through the trait.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of successful `set` calls for `key`.
    pub fn write_count(&self, key: &str) -> usize {
        self.write_counts.get(key).copied().unwrap_or(0)
    }

    /// Bytes currently used by all keys and values.
    pub fn used_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }
}

impl KvStorage for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        if self.failing_reads {
            return Err(StorageError::Unavailable {
                key: key.to_string(),
                reason: "read failure injected".to_string(),
            });
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if let Some(capacity) = self.capacity_bytes {
            let replaced = self
                .entries
                .get(key)
                .map_or(0, |previous| key.len() + previous.len());
            let projected = self.used_bytes() - replaced + key.len() + value.len();
            if projected > capacity {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    attempted_bytes: value.len(),
                });
            }
        }

        self.entries.insert(key.to_string(), value.to_string());
        *self.write_counts.entry(key.to_string()).or_insert(0) += 1;
        Ok(())
    }
}
