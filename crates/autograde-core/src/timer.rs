//! # Timer Queue
//!
//! Deterministic single-shot scheduler for policy expiry.
//!
//! The core never reads a clock. The host advances time by calling
//! [`TimerQueue::drain_due`] with the current timestamp; cancelled timers
//! are removed immediately and can never fire afterwards.

use crate::{ActorId, Timestamp};
use std::collections::BTreeMap;

/// Handle of a scheduled expiry. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy)]
struct Pending {
    actor: ActorId,
    at: Timestamp,
}

/// Pending single-shot timers.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    next: u64,
    pending: BTreeMap<TimerHandle, Pending>,
}

impl TimerQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an expiry for `actor` at `at`.
    pub fn schedule(&mut self, actor: ActorId, at: Timestamp) -> TimerHandle {
        self.next = self.next.saturating_add(1);
        let handle = TimerHandle(self.next);
        self.pending.insert(handle, Pending { actor, at });
        handle
    }

    /// Cancel a timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.pending.remove(&handle).is_some()
    }

    /// Deadline of a pending timer.
    #[must_use]
    pub fn expiry(&self, handle: TimerHandle) -> Option<Timestamp> {
        self.pending.get(&handle).map(|p| p.at)
    }

    /// Remove and return every timer due at `now`, earliest deadline first.
    pub fn drain_due(&mut self, now: Timestamp) -> Vec<(TimerHandle, ActorId)> {
        let mut due: Vec<(TimerHandle, Pending)> = self
            .pending
            .iter()
            .filter(|(_, p)| p.at <= now)
            .map(|(h, p)| (*h, *p))
            .collect();
        for (handle, _) in &due {
            self.pending.remove(handle);
        }
        due.sort_by_key(|(handle, p)| (p.at, *handle));
        due.into_iter().map(|(h, p)| (h, p.actor)).collect()
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if no timer is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Cancel everything.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
