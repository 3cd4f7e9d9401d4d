//! # Damage Cooldown Tracker
//!
//! Records recent explosive damage per location and answers whether
//! auto-upgrade is currently suppressed there.
//!
//! - Keyed by [`LocationKey`], not structure identity: a piece destroyed and
//!   rebuilt on the same spot stays suppressed
//! - Last write wins: a new hit replaces the stored expiry
//! - Queries never mutate; expired entries are removed only by [`prune`]
//!
//! [`prune`]: DamageCooldownTracker::prune

use crate::{LocationKey, Timestamp};
use std::collections::BTreeMap;

/// Location-keyed suppression windows shared by all actors.
#[derive(Debug, Clone, Default)]
pub struct DamageCooldownTracker {
    entries: BTreeMap<LocationKey, Timestamp>,
}

impl DamageCooldownTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress `location` until `suppressed_until`, replacing any entry.
    pub fn record_hit(&mut self, location: LocationKey, suppressed_until: Timestamp) {
        self.entries.insert(location, suppressed_until);
    }

    /// Check if `location` is suppressed at `now`.
    #[must_use]
    pub fn is_suppressed(&self, location: &LocationKey, now: Timestamp) -> bool {
        self.entries
            .get(location)
            .is_some_and(|until| *until > now)
    }

    /// Stored expiry for a location, expired or not.
    #[must_use]
    pub fn suppressed_until(&self, location: &LocationKey) -> Option<Timestamp> {
        self.entries.get(location).copied()
    }

    /// Remove every entry whose expiry has passed. Returns how many.
    pub fn prune(&mut self, now: Timestamp) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, until| *until > now);
        before - self.entries.len()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spot() -> LocationKey {
        LocationKey::from_millimetres(12_000, 0, -4_500)
    }

    #[test]
    fn suppressed_until_expiry() {
        let mut tracker = DamageCooldownTracker::new();
        tracker.record_hit(spot(), Timestamp(130));

        assert!(tracker.is_suppressed(&spot(), Timestamp(100)));
        assert!(tracker.is_suppressed(&spot(), Timestamp(129)));
        assert!(!tracker.is_suppressed(&spot(), Timestamp(130)));
    }

    #[test]
    fn query_does_not_prune() {
        let mut tracker = DamageCooldownTracker::new();
        tracker.record_hit(spot(), Timestamp(10));

        assert!(!tracker.is_suppressed(&spot(), Timestamp(50)));
        assert_eq!(tracker.len(), 1);

        assert_eq!(tracker.prune(Timestamp(50)), 1);
        assert!(tracker.is_empty());
    }

    #[test]
    fn last_write_wins() {
        let mut tracker = DamageCooldownTracker::new();
        tracker.record_hit(spot(), Timestamp(200));
        tracker.record_hit(spot(), Timestamp(150));

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.suppressed_until(&spot()), Some(Timestamp(150)));
    }

    #[test]
    fn prune_keeps_live_entries() {
        let mut tracker = DamageCooldownTracker::new();
        let other = LocationKey::from_millimetres(0, 0, 0);
        tracker.record_hit(spot(), Timestamp(100));
        tracker.record_hit(other, Timestamp(300));

        assert_eq!(tracker.prune(Timestamp(200)), 1);
        assert!(tracker.is_suppressed(&other, Timestamp(200)));
    }
}
