use angles_core::config::DEFAULT_BACKUPS_KEY;
use angles_core::store::BackupRing;
use angles_core::{
    CanonicalSnapshot, KvStorage, ManualClock, MemoryStorage, StorageError, StorageResult, Store,
    StoreConfig, StoreError,
};
use serde_json::json;

#[test]
fn ring_keeps_most_recent_entries_newest_first() {
    let ring = BackupRing::new("backups", 5);
    let mut storage = MemoryStorage::new();

    for index in 1..=7 {
        let length = ring
            .push_backup(&mut storage, &with_hold(&format!("h{index}")), index)
            .unwrap();
        assert_eq!(length, usize::try_from(index).unwrap().min(5));
    }

    let entries = ring.entries(&storage).unwrap();
    let timestamps: Vec<i64> = entries.iter().map(|entry| entry.timestamp).collect();
    assert_eq!(timestamps, vec![7, 6, 5, 4, 3]);
    assert_eq!(entries[0].snapshot.holds, vec!["h7"]);
    assert_eq!(entries[4].snapshot.holds, vec!["h3"]);
}

#[test]
fn corrupt_ring_reads_as_empty_and_is_replaced() {
    let ring = BackupRing::new("backups", 5);
    let mut storage = MemoryStorage::new().with_entry("backups", "garbage");

    assert!(ring.entries(&storage).unwrap().is_empty());
    assert_eq!(
        ring.push_backup(&mut storage, &with_hold("a"), 1).unwrap(),
        1
    );
}

#[test]
fn unreadable_entries_are_skipped_and_snapshots_re_migrated() {
    let raw = json!([
        { "timestamp": 5, "snapshot": { "holds": ["b", "B"], "angles": [{ "hold": "zzz" }] } },
        { "snapshot": { "holds": [] } },
        3
    ]);
    let storage = MemoryStorage::new().with_entry("backups", raw.to_string());
    let entries = BackupRing::new("backups", 5).entries(&storage).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].timestamp, 5);
    assert_eq!(entries[0].snapshot.holds, vec!["b"]);
    assert!(entries[0].snapshot.angles.is_empty());
}

#[test]
fn store_restores_backup_as_bulk_replace() {
    let clock = ManualClock::new(10);
    let mut store = Store::open(MemoryStorage::new(), clock.clone(), StoreConfig::default())
        .unwrap();
    let seeded = store.snapshot().clone();

    assert!(store.replace_with_backup(&with_hold("Imported")).unwrap());
    assert_eq!(store.snapshot().holds, vec!["Imported"]);

    clock.set(20);
    assert!(store.restore_backup(0).unwrap());
    assert_eq!(store.snapshot(), &seeded);

    let entries = store.backups().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].timestamp, 20);
    assert_eq!(entries[0].snapshot.holds, vec!["Imported"]);
    assert_eq!(entries[1].snapshot, seeded);

    let err = store.restore_backup(9).unwrap_err();
    assert!(matches!(err, StoreError::BackupNotFound(9)));
}

#[test]
fn failed_backup_does_not_block_replace() {
    let mut store = Store::open(
        RejectingBackups(MemoryStorage::new()),
        ManualClock::new(0),
        StoreConfig::default(),
    )
    .unwrap();

    let backup_written = store.replace_with_backup(&with_hold("Imported")).unwrap();
    assert!(!backup_written);
    assert_eq!(store.snapshot().holds, vec!["Imported"]);
    assert!(store.has_pending_write());
}

/// Storage whose backup slot is always full.
struct RejectingBackups(MemoryStorage);

impl KvStorage for RejectingBackups {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.0.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if key == DEFAULT_BACKUPS_KEY {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                attempted_bytes: value.len(),
            });
        }
        self.0.set(key, value)
    }
}

fn with_hold(name: &str) -> CanonicalSnapshot {
    let mut snapshot = CanonicalSnapshot::empty();
    snapshot.holds.push(name.to_string());
    snapshot
}
