//! # Policy State
//!
//! Per-actor auto-upgrade policy and its expiry timer.
//!
//! ## States
//!
//! | State | Condition | Timer |
//! |-------|-----------|-------|
//! | Armed | `tier > 0` | optional, single pending expiry |
//! | Disabled | `tier == 0` | none |
//!
//! - `set_tier(0)` cancels the timer before the transition
//! - `rearm` replaces any pending expiry with one scheduled from `now`
//! - Expiry disables the policy; a stale handle (already replaced or
//!   cancelled) is ignored

use crate::config::TimerSettings;
use crate::timer::{TimerHandle, TimerQueue};
use crate::{ActorId, Tier, Timestamp, VariantId};
use std::collections::BTreeMap;

/// Desired tier, variant and expiry for one actor.
#[derive(Debug, Clone)]
pub struct PolicyState {
    actor: ActorId,
    tier: Tier,
    variant: VariantId,
    /// Explicit timeout set by the actor, if any.
    timeout: Option<u32>,
    timer: Option<TimerHandle>,
}

impl PolicyState {
    /// Create a disabled policy.
    #[must_use]
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            tier: Tier::DISABLED,
            variant: VariantId::DEFAULT,
            timeout: None,
            timer: None,
        }
    }

    /// Owning actor.
    #[must_use]
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// Desired tier (`0` = disabled).
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Check the Armed state.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        !self.tier.is_disabled()
    }

    /// Set the desired tier. Disabling cancels any pending expiry.
    pub fn set_tier(&mut self, tier: Tier, timers: &mut TimerQueue) {
        if tier.is_disabled() {
            self.cancel_timer(timers);
        }
        self.tier = tier;
    }

    /// Desired variant.
    #[must_use]
    pub fn variant(&self) -> VariantId {
        self.variant
    }

    /// Set the desired variant.
    pub fn set_variant(&mut self, variant: VariantId) {
        self.variant = variant;
    }

    /// Timeout explicitly chosen by the actor.
    #[must_use]
    pub fn configured_timeout(&self) -> Option<u32> {
        self.timeout
    }

    /// Set the actor's own timeout. Zero clears it.
    pub fn set_timeout(&mut self, seconds: u32) {
        self.timeout = (seconds > 0).then_some(seconds);
    }

    /// Seconds until auto-disable, or `0` if timers are globally off.
    ///
    /// With `rearm`, the countdown restarts from `now` as a side effect.
    pub fn effective_timeout_seconds(
        &mut self,
        rearm: bool,
        settings: &TimerSettings,
        timers: &mut TimerQueue,
        now: Timestamp,
    ) -> u32 {
        if !settings.enabled {
            return 0;
        }
        if rearm {
            self.rearm(settings, timers, now);
        }
        self.timeout_for(settings)
    }

    /// Replace any pending expiry with one scheduled from `now`.
    ///
    /// Only schedules while Armed with a positive timeout.
    pub fn rearm(&mut self, settings: &TimerSettings, timers: &mut TimerQueue, now: Timestamp) {
        self.cancel_timer(timers);

        let seconds = self.timeout_for(settings);
        if !settings.enabled || !self.is_armed() || seconds == 0 {
            return;
        }
        self.timer = Some(timers.schedule(self.actor, now.plus_seconds(u64::from(seconds))));
    }

    /// Cancel the pending expiry, if any.
    pub fn cancel_timer(&mut self, timers: &mut TimerQueue) {
        if let Some(handle) = self.timer.take() {
            timers.cancel(handle);
        }
    }

    /// Deadline of the pending expiry.
    #[must_use]
    pub fn pending_expiry(&self, timers: &TimerQueue) -> Option<Timestamp> {
        self.timer.and_then(|handle| timers.expiry(handle))
    }

    fn timeout_for(&self, settings: &TimerSettings) -> u32 {
        self.timeout.unwrap_or(settings.default_seconds)
    }

    /// Apply a fired timer. Returns `true` if it was this policy's live timer.
    fn expire(&mut self, handle: TimerHandle) -> bool {
        if self.timer != Some(handle) {
            return false;
        }
        self.timer = None;
        self.tier = Tier::DISABLED;
        true
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// The actor → policy map, together with the timers its policies own.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: BTreeMap<ActorId, PolicyState>,
    timers: TimerQueue,
}

impl PolicyRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy of an actor, if one was ever created.
    #[must_use]
    pub fn get(&self, actor: ActorId) -> Option<&PolicyState> {
        self.policies.get(&actor)
    }

    /// Mutable access to an existing policy and the timer queue.
    pub fn existing_mut(&mut self, actor: ActorId) -> Option<(&mut PolicyState, &mut TimerQueue)> {
        let policy = self.policies.get_mut(&actor)?;
        Some((policy, &mut self.timers))
    }

    /// Mutable access, creating a disabled policy on first use.
    pub fn get_or_create(&mut self, actor: ActorId) -> (&mut PolicyState, &mut TimerQueue) {
        let policy = self
            .policies
            .entry(actor)
            .or_insert_with(|| PolicyState::new(actor));
        (policy, &mut self.timers)
    }

    /// Destroy an actor's policy, cancelling its timer first.
    pub fn remove(&mut self, actor: ActorId) -> Option<PolicyState> {
        let mut policy = self.policies.remove(&actor)?;
        policy.cancel_timer(&mut self.timers);
        Some(policy)
    }

    /// Fire every due expiry. Returns the actors whose policy was disabled.
    pub fn fire_due(&mut self, now: Timestamp) -> Vec<ActorId> {
        let mut disabled = Vec::new();
        for (handle, actor) in self.timers.drain_due(now) {
            if let Some(policy) = self.policies.get_mut(&actor) {
                if policy.expire(handle) {
                    disabled.push(actor);
                }
            }
        }
        disabled
    }

    /// Deadline of an actor's pending expiry.
    #[must_use]
    pub fn pending_expiry(&self, actor: ActorId) -> Option<Timestamp> {
        self.policies
            .get(&actor)
            .and_then(|p| p.pending_expiry(&self.timers))
    }

    /// Number of pending timers across all actors.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Number of stored policies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Check if no policy is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Drop every policy and cancel every timer.
    pub fn clear(&mut self) {
        self.timers.clear();
        self.policies.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
