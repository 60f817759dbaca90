//! Debounced write scheduler.
//!
//! An explicit two-state machine: `Idle` or `Pending(PendingWrite)`. Every
//! `schedule` replaces the pending snapshot wholesale and pushes the deadline
//! out, so at most one write is ever outstanding and an older snapshot can
//! never be persisted after a newer one.
//!
//! The scheduler does not touch storage or read the clock; the store feeds
//! it `now_ms` and performs the writes it hands back.

use crate::model::snapshot::CanonicalSnapshot;

/// The single outstanding write.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    pub snapshot: CanonicalSnapshot,
    /// When the latest mutation was scheduled.
    pub scheduled_at_ms: i64,
    /// When the quiet period expires.
    pub deadline_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SchedulerState {
    #[default]
    Idle,
    Pending(PendingWrite),
}

#[derive(Debug, Clone)]
pub struct WriteScheduler {
    window_ms: i64,
    state: SchedulerState,
}

impl WriteScheduler {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms: i64::try_from(window_ms).unwrap_or(i64::MAX),
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, SchedulerState::Pending(_))
    }

    pub fn deadline_ms(&self) -> Option<i64> {
        match &self.state {
            SchedulerState::Idle => None,
            SchedulerState::Pending(pending) => Some(pending.deadline_ms),
        }
    }

    /// Records `snapshot` as the pending write and restarts the quiet period.
    ///
    /// Returns `true` when an earlier pending snapshot was coalesced away.
    pub fn schedule(&mut self, snapshot: CanonicalSnapshot, now_ms: i64) -> bool {
        let replaced = self.is_pending();
        self.state = SchedulerState::Pending(PendingWrite {
            snapshot,
            scheduled_at_ms: now_ms,
            deadline_ms: now_ms.saturating_add(self.window_ms),
        });
        replaced
    }

    /// Hands back the pending write once its deadline has passed.
    pub fn take_due(&mut self, now_ms: i64) -> Option<PendingWrite> {
        match self.deadline_ms() {
            Some(deadline_ms) if now_ms >= deadline_ms => self.take_pending(),
            _ => None,
        }
    }

    /// Puts back a write whose durable attempt failed.
    ///
    /// The retry waits one more quiet period. A snapshot scheduled in the
    /// meantime is newer and wins.
    pub fn requeue(&mut self, pending: PendingWrite, now_ms: i64) {
        if self.is_pending() {
            return;
        }
        self.state = SchedulerState::Pending(PendingWrite {
            deadline_ms: now_ms.saturating_add(self.window_ms),
            ..pending
        });
    }

    /// Hands back the pending write regardless of its deadline (teardown).
    pub fn take_pending(&mut self) -> Option<PendingWrite> {
        match std::mem::take(&mut self.state) {
            SchedulerState::Idle => None,
            SchedulerState::Pending(pending) => Some(pending),
        }
    }
}
