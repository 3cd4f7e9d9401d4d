//! # Upgrade Decision Engine
//!
//! Runs the placement-time policy chain and produces an [`Outcome`].
//!
//! The chain short-circuits on the first failing step:
//!
//! 1. structural placements only
//! 2. build rights at the location
//! 3. any relevant capability (fast reject)
//! 4. an armed policy
//! 5. capability for the policy tier
//! 6. `can_upgrade` hook (veto or refund-and-remove override)
//! 7. tier not below the placed tier, tier slot present on the piece
//! 8. damage suppression at the location
//! 9. `on_structure_upgrade` hook veto
//! 10. cost lookup and affordability (skipped with the no-cost privilege)
//! 11. resource deduction, once
//! 12. timer re-arm
//! 13. variant resolution
//! 14. piece mutation
//! 15. cosmetic effect for the placing actor
//!
//! Steps 1-9 are silent. Only affordability failure reaches the actor.

use crate::capability::CapabilityGate;
use crate::config::{AutogradeConfig, TimerSettings};
use crate::cooldown::DamageCooldownTracker;
use crate::cost::CostCatalog;
use crate::host::{Host, HookVerdict, Notice};
use crate::policy::PolicyRegistry;
use crate::{PlacementEvent, PlacementKind, Tier, Timestamp, VariantId};
use serde::{Deserialize, Serialize};

// =============================================================================
// OUTCOME
// =============================================================================

/// Expected non-eligibility. Never surfaced to the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The service is stopped.
    Inactive,
    NotStructural,
    NoBuildRights,
    NoCapability,
    /// The actor never set a policy.
    NoPolicy,
    PolicyDisabled,
    TierNotPermitted,
    BelowPlacedTier,
    /// The piece cannot be built at the policy tier.
    TierUnavailable,
    /// Recent explosive damage at the location.
    Suppressed,
}

/// The upgrade was attempted and stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// `can_upgrade` vetoed.
    HookVeto,
    /// `can_upgrade` replaced the upgrade with refund-and-remove.
    HookOverride { code: i32, removed: bool, refunded: bool },
    /// `on_structure_upgrade` vetoed.
    UpgradeHookVeto,
    InsufficientResources,
    /// Authoring data has no cost entry for the tier.
    MissingCost,
}

/// Result of one placement decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Applied { tier: Tier, variant: VariantId },
    Skipped(SkipReason),
    Blocked(BlockReason),
}

impl Outcome {
    /// Check if the piece was upgraded.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied { .. })
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Placement-time decision pipeline.
#[derive(Debug, Clone)]
pub struct UpgradeDecisionEngine {
    gate: CapabilityGate,
    timer: TimerSettings,
    check_cooldown: bool,
    refund_on_block: bool,
    play_animation: bool,
}

impl UpgradeDecisionEngine {
    /// Build an engine from configuration.
    #[must_use]
    pub fn new(config: &AutogradeConfig) -> Self {
        Self {
            gate: CapabilityGate::new(&config.capabilities.prefix),
            timer: config.timer,
            check_cooldown: config.damage_cooldown.enabled,
            refund_on_block: config.refund.on_block,
            play_animation: config.behavior.play_upgrade_animation,
        }
    }

    /// The capability gate used by this engine.
    #[must_use]
    pub fn gate(&self) -> &CapabilityGate {
        &self.gate
    }

    /// Decide, and apply, the auto-upgrade for one placement.
    pub fn on_placement<H>(
        &self,
        host: &mut H,
        policies: &mut PolicyRegistry,
        cooldowns: &DamageCooldownTracker,
        event: &PlacementEvent,
        now: Timestamp,
    ) -> Outcome
    where
        H: Host + ?Sized,
    {
        let outcome = self.decide(host, policies, cooldowns, event, now);
        tracing::debug!(
            actor = %event.actor,
            piece = event.piece.id.0,
            outcome = ?outcome,
            "placement decided"
        );
        outcome
    }

    fn decide<H>(
        &self,
        host: &mut H,
        policies: &mut PolicyRegistry,
        cooldowns: &DamageCooldownTracker,
        event: &PlacementEvent,
        now: Timestamp,
    ) -> Outcome
    where
        H: Host + ?Sized,
    {
        let actor = event.actor;
        let piece = &event.piece;

        if event.kind != PlacementKind::Structural {
            return Outcome::Skipped(SkipReason::NotStructural);
        }
        if !host.can_build(actor, piece) {
            return Outcome::Skipped(SkipReason::NoBuildRights);
        }
        if !self.gate.has_any_relevant_capability(&*host, actor) {
            return Outcome::Skipped(SkipReason::NoCapability);
        }

        let Some(policy) = policies.get(actor) else {
            return Outcome::Skipped(SkipReason::NoPolicy);
        };
        let tier = policy.tier();
        let stored_variant = policy.variant();
        if tier.is_disabled() {
            return Outcome::Skipped(SkipReason::PolicyDisabled);
        }
        if !self.gate.can_use_tier(&*host, actor, tier) {
            return Outcome::Skipped(SkipReason::TierNotPermitted);
        }

        match host.can_upgrade(actor, tier, piece, event) {
            HookVerdict::NoOpinion => {}
            HookVerdict::Veto => return Outcome::Blocked(BlockReason::HookVeto),
            HookVerdict::OverrideWithRefundCode(code) => {
                return Outcome::Blocked(self.refund_and_remove(host, event, code));
            }
        }

        if tier < piece.tier {
            return Outcome::Skipped(SkipReason::BelowPlacedTier);
        }
        if !piece.definition.has_tier_slot(tier) {
            return Outcome::Skipped(SkipReason::TierUnavailable);
        }
        if self.check_cooldown && cooldowns.is_suppressed(&piece.location, now) {
            return Outcome::Skipped(SkipReason::Suppressed);
        }
        if host.on_structure_upgrade(piece, actor, tier) != HookVerdict::NoOpinion {
            return Outcome::Blocked(BlockReason::UpgradeHookVeto);
        }

        if !self.gate.has_no_cost_privilege(&*host, actor) {
            let cost = match CostCatalog::cost_for(&piece.definition, tier) {
                Ok(cost) => cost,
                Err(e) => {
                    tracing::error!(
                        piece = %piece.definition.name,
                        tier = %tier,
                        error = %e,
                        "cost table is missing an entry; upgrade abandoned"
                    );
                    return Outcome::Blocked(BlockReason::MissingCost);
                }
            };
            if !CostCatalog::can_afford(&*host, actor, &cost) {
                host.notify(actor, Notice::InsufficientResources);
                return Outcome::Blocked(BlockReason::InsufficientResources);
            }
            host.take_items(actor, &cost);
        }

        if self.timer.enabled {
            if let Some((policy, timers)) = policies.existing_mut(actor) {
                policy.rearm(&self.timer, timers, now);
            }
        }

        let variant = if self.gate.has_skins(&*host, actor) {
            stored_variant
        } else {
            VariantId::DEFAULT
        };

        host.apply_upgrade(piece, tier, variant);
        if self.play_animation {
            host.play_upgrade_effect(actor, piece, tier, variant);
        }

        Outcome::Applied { tier, variant }
    }

    /// Third-party override: optionally refund the placed piece's own build
    /// cost, then remove it. Codes `<= 0` leave the piece untouched.
    fn refund_and_remove<H>(&self, host: &mut H, event: &PlacementEvent, code: i32) -> BlockReason
    where
        H: Host + ?Sized,
    {
        if code <= 0 {
            return BlockReason::HookOverride {
                code,
                removed: false,
                refunded: false,
            };
        }

        let piece = &event.piece;
        let mut refunded = false;
        if self.refund_on_block {
            match CostCatalog::cost_for(&piece.definition, piece.tier) {
                Ok(cost) => {
                    for (item, amount) in cost.iter() {
                        host.give_item(event.actor, item, amount);
                    }
                    refunded = true;
                }
                Err(e) => {
                    tracing::warn!(
                        piece = %piece.definition.name,
                        error = %e,
                        "no build cost to refund for overridden placement"
                    );
                }
            }
        }
        host.remove_piece(piece);

        BlockReason::HookOverride {
            code,
            removed: true,
            refunded,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
