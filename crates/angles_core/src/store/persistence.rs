//! Persistence store.
//!
//! # Responsibility
//! - Own the in-memory canonical snapshot and the last-modified marker.
//! - Load and self-heal the durable snapshot at open.
//! - Route every replacement through the migrator, the quota guard and the
//!   write scheduler.
//!
//! # Invariants
//! - `snapshot()` is always the output of `migrate`.
//! - A replacement rejected by the quota guard leaves memory and storage
//!   untouched.
//! - A failed durable write is reported but never rolls back memory; the
//!   snapshot stays pending until a later flush succeeds.
//!
//! # Teardown
//! Pending writes are flushed by `close`, `on_teardown` and `Drop`. The flush
//! is synchronous and best effort: if the host kills the process before it
//! returns, at most one debounce window of edits is lost.

use crate::clock::Clock;
use crate::config::StoreConfig;
use crate::migrate::migrate;
use crate::model::snapshot::{BackupEntry, CanonicalSnapshot};
use crate::storage::KvStorage;
use crate::store::{
    BackupRing, PendingWrite, QuotaGuard, StoreError, StoreResult, WriteScheduler,
};
use log::{debug, error, info, warn};
use serde_json::Value;

/// Result of one flush attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was pending (or not yet due).
    Idle,
    Written { bytes: usize, written_at_ms: i64 },
}

pub struct Store<S: KvStorage, C: Clock> {
    storage: S,
    clock: C,
    config: StoreConfig,
    snapshot: CanonicalSnapshot,
    scheduler: WriteScheduler,
    quota: QuotaGuard,
    backups: BackupRing,
    last_modified_ms: Option<i64>,
}

impl<S: KvStorage, C: Clock> Store<S, C> {
    /// Validates `config`, then loads (and self-heals) the durable snapshot.
    pub fn open(storage: S, clock: C, config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;

        let mut store = Self {
            scheduler: WriteScheduler::new(config.debounce_ms),
            quota: QuotaGuard::new(config.quota_bytes),
            backups: BackupRing::new(config.backups_key.clone(), config.backup_limit),
            snapshot: CanonicalSnapshot::empty(),
            last_modified_ms: None,
            storage,
            clock,
            config,
        };
        store.last_modified_ms = store.last_modified();
        store.load()?;

        info!(
            "event=store_open module=store status=ok holds={} angles={} cover_images={}",
            store.snapshot.holds.len(),
            store.snapshot.angles.len(),
            store.snapshot.hold_images.len()
        );
        Ok(store)
    }

    /// Re-reads the durable snapshot into memory.
    ///
    /// Missing, unreadable or unparsable data falls back to the migrated
    /// defaults. Parsed data is always re-migrated and written back when the
    /// healed form differs. A pending write is flushed first.
    ///
    /// # Errors
    /// - The pending write could not be flushed. Memory is left as it was and
    ///   the write stays pending, so durable state never overwrites newer
    ///   edits.
    pub fn load(&mut self) -> StoreResult<&CanonicalSnapshot> {
        if self.scheduler.is_pending() {
            if let Err(err) = self.flush_now() {
                warn!("event=store_load module=store status=skip error_code=pre_load_flush_failed error={err}");
                return Err(err);
            }
        }
        self.snapshot = self.read_durable();
        Ok(&self.snapshot)
    }

    pub fn snapshot(&self) -> &CanonicalSnapshot {
        &self.snapshot
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Replaces the snapshot with a typed candidate. See `replace_raw`.
    pub fn replace(&mut self, next: &CanonicalSnapshot) -> StoreResult<()> {
        let document = next.to_document()?;
        self.replace_raw(&document)
    }

    /// Migrates `next_raw`, checks its size and schedules a durable write.
    ///
    /// # Errors
    /// - `StoreError::Capacity` when the migrated snapshot exceeds the quota;
    ///   nothing changes in that case.
    pub fn replace_raw(&mut self, next_raw: &Value) -> StoreResult<()> {
        let candidate = migrate(next_raw);
        self.quota.check_size(&candidate)?;

        self.snapshot = candidate.clone();
        let now_ms = self.clock.now_ms();
        let coalesced = self.scheduler.schedule(candidate, now_ms);
        debug!(
            "event=write_scheduled module=scheduler status=ok coalesced={} deadline_ms={}",
            coalesced,
            self.scheduler.deadline_ms().unwrap_or(now_ms)
        );
        Ok(())
    }

    /// Replaces the snapshot after backing up the current one.
    ///
    /// Used for bulk replacements (import, restore). The quota check runs
    /// before the backup so a rejected candidate leaves no trace; a failed
    /// backup is logged and does not block the replacement.
    ///
    /// Returns whether the backup was written.
    pub fn replace_with_backup(&mut self, next: &CanonicalSnapshot) -> StoreResult<bool> {
        let candidate = migrate(&next.to_document()?);
        self.quota.check_size(&candidate)?;

        let backup_written = match self.push_backup() {
            Ok(_) => true,
            Err(err) => {
                warn!("event=backup_push module=backup status=error error={err}");
                false
            }
        };
        self.replace(&candidate)?;
        Ok(backup_written)
    }

    /// Snapshots the current in-memory state into the backup ring.
    pub fn push_backup(&mut self) -> StoreResult<usize> {
        let timestamp = self.clock.now_ms();
        self.backups
            .push_backup(&mut self.storage, &self.snapshot, timestamp)
    }

    /// Lists stored backups, newest first.
    pub fn backups(&self) -> StoreResult<Vec<BackupEntry>> {
        self.backups.entries(&self.storage)
    }

    /// Restores the backup at `index` (0 = newest) as a bulk replacement.
    pub fn restore_backup(&mut self, index: usize) -> StoreResult<bool> {
        let entry = self
            .backups()?
            .into_iter()
            .nth(index)
            .ok_or(StoreError::BackupNotFound(index))?;
        self.replace_with_backup(&entry.snapshot)
    }

    pub fn has_pending_write(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// When the host should next call `tick`, if anything is pending.
    pub fn next_deadline(&self) -> Option<i64> {
        self.scheduler.deadline_ms()
    }

    /// Writes the pending snapshot if its quiet period has elapsed.
    pub fn tick(&mut self) -> StoreResult<FlushOutcome> {
        let now_ms = self.clock.now_ms();
        match self.scheduler.take_due(now_ms) {
            Some(pending) => self.write_pending(pending, "debounce"),
            None => Ok(FlushOutcome::Idle),
        }
    }

    /// Writes the pending snapshot immediately.
    pub fn flush_now(&mut self) -> StoreResult<FlushOutcome> {
        match self.scheduler.take_pending() {
            Some(pending) => self.write_pending(pending, "forced"),
            None => Ok(FlushOutcome::Idle),
        }
    }

    /// Teardown signal from the host (page hide, process exit).
    pub fn on_teardown(&mut self) -> StoreResult<FlushOutcome> {
        match self.scheduler.take_pending() {
            Some(pending) => self.write_pending(pending, "teardown"),
            None => Ok(FlushOutcome::Idle),
        }
    }

    /// Flushes and releases the store.
    pub fn close(mut self) -> StoreResult<FlushOutcome> {
        let outcome = self.on_teardown();
        info!("event=store_close module=store status={}", status_of(&outcome));
        outcome
    }

    /// Reads the last-modified marker straight from storage.
    pub fn last_modified(&self) -> Option<i64> {
        match self.storage.get(&self.config.last_modified_key) {
            Ok(Some(text)) => text.trim().parse::<i64>().ok(),
            Ok(None) => None,
            Err(err) => {
                warn!("event=last_modified_read module=store status=error error={err}");
                None
            }
        }
    }

    fn read_durable(&mut self) -> CanonicalSnapshot {
        let text = match self.storage.get(&self.config.snapshot_key) {
            Ok(Some(text)) => text,
            Ok(None) => {
                info!("event=store_load module=store status=ok source=defaults reason=missing");
                return migrate(&Value::Null);
            }
            Err(err) => {
                warn!("event=store_load module=store status=error source=defaults error_code=read_failed error={err}");
                return migrate(&Value::Null);
            }
        };

        let parsed = match serde_json::from_str::<Value>(&text) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("event=store_load module=store status=error source=defaults error_code=parse_failed error={err}");
                return migrate(&Value::Null);
            }
        };

        let healed = migrate(&parsed);
        if healed.to_document().ok().as_ref() != Some(&parsed) {
            match self.persist(&healed) {
                Ok(bytes) => {
                    info!("event=store_heal module=store status=ok bytes={bytes}");
                }
                Err(err) => {
                    warn!("event=store_heal module=store status=error error={err}");
                }
            }
        }
        info!(
            "event=store_load module=store status=ok source=storage bytes={}",
            text.len()
        );
        healed
    }

    fn write_pending(
        &mut self,
        pending: PendingWrite,
        trigger: &'static str,
    ) -> StoreResult<FlushOutcome> {
        match self.persist(&pending.snapshot) {
            Ok(bytes) => {
                let written_at_ms = self.clock.now_ms();
                info!(
                    "event=snapshot_write module=store status=ok trigger={} bytes={} lag_ms={}",
                    trigger,
                    bytes,
                    written_at_ms.saturating_sub(pending.scheduled_at_ms)
                );
                Ok(FlushOutcome::Written {
                    bytes,
                    written_at_ms,
                })
            }
            Err(err) => {
                error!(
                    "event=snapshot_write module=store status=error trigger={trigger} error={err}"
                );
                let now_ms = self.clock.now_ms();
                self.scheduler.requeue(pending, now_ms);
                Err(err)
            }
        }
    }

    /// The only durable write of the snapshot slot.
    fn persist(&mut self, snapshot: &CanonicalSnapshot) -> StoreResult<usize> {
        let payload = self.quota.check_size(snapshot)?;
        self.storage.set(&self.config.snapshot_key, &payload)?;
        self.mark_modified();
        Ok(payload.len())
    }

    fn mark_modified(&mut self) {
        let now_ms = self.clock.now_ms();
        let marker = self
            .last_modified_ms
            .map_or(now_ms, |previous| previous.max(now_ms));
        self.last_modified_ms = Some(marker);
        if let Err(err) = self
            .storage
            .set(&self.config.last_modified_key, &marker.to_string())
        {
            warn!("event=last_modified_write module=store status=error error={err}");
        }
    }
}

impl<S: KvStorage, C: Clock> Drop for Store<S, C> {
    fn drop(&mut self) {
        if !self.scheduler.is_pending() {
            return;
        }
        if let Err(err) = self.on_teardown() {
            error!("event=store_drop module=store status=error error={err}");
        }
    }
}

fn status_of(outcome: &StoreResult<FlushOutcome>) -> &'static str {
    match outcome {
        Ok(_) => "ok",
        Err(_) => "error",
    }
}
