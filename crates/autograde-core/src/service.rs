//! # Autograde Service
//!
//! The explicitly constructed service object that owns all core state:
//! the policy registry (with its timers), the damage cooldown tracker and the
//! decision engine.
//!
//! ## Lifecycle
//!
//! - `new` validates configuration; the service starts stopped
//! - `start` begins accepting events
//! - `stop` cancels every timer and drops all per-actor and cooldown state
//!
//! ## Events
//!
//! The host delivers events one at a time. Each handler runs to completion
//! before the next begins, so no step of a placement decision can interleave
//! with another event.

use crate::capability::CapabilityGate;
use crate::catalog::TierCatalog;
use crate::config::AutogradeConfig;
use crate::cooldown::DamageCooldownTracker;
use crate::engine::{Outcome, SkipReason, UpgradeDecisionEngine};
use crate::host::{CapabilityAuthority, Host, Notice, World};
use crate::policy::PolicyRegistry;
use crate::{
    ActorId, AutogradeError, DamageInfo, DamageKind, LocationKey, PlacementEvent, PlacementKind,
    Timestamp,
};
use std::sync::Arc;

/// Owner of the auto-upgrade state machine.
#[derive(Debug)]
pub struct AutogradeService {
    pub(crate) config: AutogradeConfig,
    pub(crate) catalog: Arc<TierCatalog>,
    pub(crate) engine: UpgradeDecisionEngine,
    pub(crate) policies: PolicyRegistry,
    cooldowns: DamageCooldownTracker,
    running: bool,
}

impl AutogradeService {
    /// Create a stopped service with the standard tier catalog.
    pub fn new(config: AutogradeConfig) -> Result<Self, AutogradeError> {
        Self::with_catalog(config, Arc::new(TierCatalog::standard()))
    }

    /// Create a stopped service with an explicit tier catalog.
    pub fn with_catalog(
        config: AutogradeConfig,
        catalog: Arc<TierCatalog>,
    ) -> Result<Self, AutogradeError> {
        config.validate()?;
        let engine = UpgradeDecisionEngine::new(&config);
        Ok(Self {
            config,
            catalog,
            engine,
            policies: PolicyRegistry::new(),
            cooldowns: DamageCooldownTracker::new(),
            running: false,
        })
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Begin accepting events.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        tracing::info!(
            capabilities = ?self.gate().registered().collect::<Vec<_>>(),
            timer_enabled = self.config.timer.enabled,
            cooldown_enabled = self.config.damage_cooldown.enabled,
            "autograde service started"
        );
    }

    /// Stop: cancel every timer and drop all state.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        let policies = self.policies.len();
        self.policies.clear();
        self.cooldowns.clear();
        self.running = false;
        tracing::info!(policies, "autograde service stopped");
    }

    /// Check if the service accepts events.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &AutogradeConfig {
        &self.config
    }

    /// Tier catalog.
    #[must_use]
    pub fn catalog(&self) -> &TierCatalog {
        &self.catalog
    }

    /// Capability gate.
    #[must_use]
    pub fn gate(&self) -> &CapabilityGate {
        self.engine.gate()
    }

    /// Policy registry (read-only).
    #[must_use]
    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    /// Damage cooldown tracker (read-only).
    #[must_use]
    pub fn cooldowns(&self) -> &DamageCooldownTracker {
        &self.cooldowns
    }

    // =========================================================================
    // INBOUND EVENTS
    // =========================================================================

    /// A piece was placed.
    pub fn on_placement<H>(&mut self, host: &mut H, event: &PlacementEvent, now: Timestamp) -> Outcome
    where
        H: Host + ?Sized,
    {
        if !self.running {
            return Outcome::Skipped(SkipReason::Inactive);
        }
        self.engine
            .on_placement(host, &mut self.policies, &self.cooldowns, event, now)
    }

    /// A structure took damage. Returns `true` if a cooldown was recorded.
    ///
    /// Only attributable explosive damage counts.
    pub fn on_structure_damaged(
        &mut self,
        location: LocationKey,
        damage: DamageInfo,
        now: Timestamp,
    ) -> bool {
        if !self.running || !self.config.damage_cooldown.enabled {
            return false;
        }
        if damage.majority != DamageKind::Explosion || damage.attacker.is_none() {
            return false;
        }
        let until = now.plus_seconds(u64::from(self.config.damage_cooldown.cooldown_seconds));
        self.cooldowns.record_hit(location, until);
        tracing::debug!(?location, until = until.value(), "upgrade cooldown recorded");
        true
    }

    /// An actor left. Returns `true` if their policy was destroyed.
    pub fn on_actor_disconnected(&mut self, actor: ActorId) -> bool {
        if !self.config.players.destroy_on_disconnect {
            return false;
        }
        let removed = self.policies.remove(actor).is_some();
        if removed {
            tracing::debug!(%actor, "policy destroyed on disconnect");
        }
        removed
    }

    /// Periodic maintenance (world save). Returns pruned cooldown entries.
    pub fn on_maintenance_tick(&mut self, now: Timestamp) -> usize {
        if !self.running {
            return 0;
        }
        let pruned = self.cooldowns.prune(now);
        if pruned > 0 {
            tracing::debug!(pruned, remaining = self.cooldowns.len(), "cooldowns pruned");
        }
        pruned
    }

    /// Fire due policy timers and tell each affected actor.
    pub fn fire_due_timers<W>(&mut self, world: &mut W, now: Timestamp) -> Vec<ActorId>
    where
        W: World + ?Sized,
    {
        if !self.running {
            return Vec::new();
        }
        let disabled = self.policies.fire_due(now);
        for actor in &disabled {
            tracing::info!(%actor, "policy auto-disabled");
            world.notify(*actor, Notice::PolicyAutoDisabled);
        }
        disabled
    }

    /// Should the base placement cost be waived?
    ///
    /// True for structural placements by an actor with the no-cost privilege
    /// and an armed policy.
    pub fn waives_placement_cost<A>(&self, authority: &A, actor: ActorId, kind: PlacementKind) -> bool
    where
        A: CapabilityAuthority + ?Sized,
    {
        if !self.running || kind != PlacementKind::Structural {
            return false;
        }
        let armed = self.policies.get(actor).is_some_and(|p| p.is_armed());
        armed && self.gate().has_no_cost_privilege(authority, actor)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PlacedPiece, Tier, VariantId};
    use std::collections::BTreeSet;

    struct Grants(BTreeSet<&'static str>);

    impl CapabilityAuthority for Grants {
        fn has_capability(&self, _actor: ActorId, name: &str) -> bool {
            self.0.contains(name)
        }
    }

    #[derive(Default)]
    struct Outbox(Vec<(ActorId, Notice)>);

    impl World for Outbox {
        fn can_build(&self, _: ActorId, _: &PlacedPiece) -> bool {
            true
        }
        fn apply_upgrade(&mut self, _: &PlacedPiece, _: Tier, _: VariantId) {}
        fn remove_piece(&mut self, _: &PlacedPiece) {}
        fn play_upgrade_effect(&mut self, _: ActorId, _: &PlacedPiece, _: Tier, _: VariantId) {}
        fn notify(&mut self, actor: ActorId, notice: Notice) {
            self.0.push((actor, notice));
        }
    }

    fn running(config: AutogradeConfig) -> AutogradeService {
        let mut service = AutogradeService::new(config).expect("valid config");
        service.start();
        service
    }

    fn explosion(attacker: Option<ActorId>) -> DamageInfo {
        DamageInfo {
            majority: DamageKind::Explosion,
            attacker,
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = AutogradeConfig::default();
        config.timer.default_seconds = 999;
        assert!(AutogradeService::new(config).is_err());
    }

    #[test]
    fn records_only_attributable_explosions() {
        let mut service = running(AutogradeConfig::default());
        let spot = LocationKey::from_millimetres(0, 0, 0);

        assert!(!service.on_structure_damaged(spot, explosion(None), Timestamp(0)));
        assert!(!service.on_structure_damaged(
            spot,
            DamageInfo {
                majority: DamageKind::Bullet,
                attacker: Some(ActorId(2)),
            },
            Timestamp(0)
        ));
        assert!(service.on_structure_damaged(spot, explosion(Some(ActorId(2))), Timestamp(0)));
        assert_eq!(service.cooldowns().suppressed_until(&spot), Some(Timestamp(30)));
    }

    #[test]
    fn cooldown_disabled_records_nothing() {
        let mut config = AutogradeConfig::default();
        config.damage_cooldown.enabled = false;
        let mut service = running(config);

        let spot = LocationKey::from_millimetres(0, 0, 0);
        assert!(!service.on_structure_damaged(spot, explosion(Some(ActorId(2))), Timestamp(0)));
        assert!(service.cooldowns().is_empty());
    }

    #[test]
    fn maintenance_prunes_expired() {
        let mut service = running(AutogradeConfig::default());
        let spot = LocationKey::from_millimetres(0, 0, 0);
        service.on_structure_damaged(spot, explosion(Some(ActorId(2))), Timestamp(0));

        assert_eq!(service.on_maintenance_tick(Timestamp(29)), 0);
        assert_eq!(service.on_maintenance_tick(Timestamp(31)), 1);
    }

    #[test]
    fn disconnect_respects_configuration() {
        let grants = Grants(BTreeSet::from(["bgrade.2"]));

        let mut keep = running(AutogradeConfig::default());
        keep.set_tier(&grants, ActorId(1), Tier::STONE, None, Timestamp(0))
            .expect("set");
        assert!(!keep.on_actor_disconnected(ActorId(1)));
        assert!(keep.policies().get(ActorId(1)).is_some());

        let mut config = AutogradeConfig::default();
        config.players.destroy_on_disconnect = true;
        let mut drop = running(config);
        drop.set_tier(&grants, ActorId(1), Tier::STONE, None, Timestamp(0))
            .expect("set");
        assert!(drop.on_actor_disconnected(ActorId(1)));
        assert!(drop.policies().get(ActorId(1)).is_none());
        assert_eq!(drop.policies().pending_timers(), 0);
    }

    #[test]
    fn timers_notify_actor() {
        let grants = Grants(BTreeSet::from(["bgrade.all"]));
        let mut service = running(AutogradeConfig::default());
        service
            .set_tier(&grants, ActorId(1), Tier::METAL, None, Timestamp(100))
            .expect("set");

        let mut outbox = Outbox::default();
        assert!(service.fire_due_timers(&mut outbox, Timestamp(129)).is_empty());
        assert_eq!(service.fire_due_timers(&mut outbox, Timestamp(130)), vec![ActorId(1)]);
        assert_eq!(outbox.0, vec![(ActorId(1), Notice::PolicyAutoDisabled)]);
    }

    #[test]
    fn stop_drops_state_and_timers() {
        let grants = Grants(BTreeSet::from(["bgrade.all"]));
        let mut service = running(AutogradeConfig::default());
        service
            .set_tier(&grants, ActorId(1), Tier::METAL, None, Timestamp(0))
            .expect("set");

        service.stop();
        assert!(service.policies().is_empty());
        assert_eq!(service.policies().pending_timers(), 0);

        service.start();
        let mut outbox = Outbox::default();
        assert!(service.fire_due_timers(&mut outbox, Timestamp(1000)).is_empty());
        assert!(outbox.0.is_empty());
    }

    #[test]
    fn placement_cost_waived_only_with_privilege_and_armed_policy() {
        let grants = Grants(BTreeSet::from(["bgrade.all", "bgrade.nores"]));
        let mut service = running(AutogradeConfig::default());
        let actor = ActorId(1);

        assert!(!service.waives_placement_cost(&grants, actor, PlacementKind::Structural));

        service
            .set_tier(&grants, actor, Tier::STONE, None, Timestamp(0))
            .expect("set");
        assert!(service.waives_placement_cost(&grants, actor, PlacementKind::Structural));
        assert!(!service.waives_placement_cost(&grants, actor, PlacementKind::Deployable));

        let plain = Grants(BTreeSet::from(["bgrade.all"]));
        assert!(!service.waives_placement_cost(&plain, actor, PlacementKind::Structural));
    }
}
