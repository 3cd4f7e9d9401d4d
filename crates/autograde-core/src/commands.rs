//! # Command Operations
//!
//! The mutations and read models behind the chat and console commands.
//! Parsing and localization belong to the caller; everything here works on
//! typed arguments and returns typed replies.
//!
//! Every operation first requires the actor to hold at least one capability
//! recognized by the gate.

use crate::catalog::DEFAULT_VARIANT_LABEL;
use crate::host::CapabilityAuthority;
use crate::primitives::MAX_TIER;
use crate::service::AutogradeService;
use crate::{ActorId, Tier, Timestamp, VariantId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User-correctable command failures. No state is mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("actor lacks the capability for this command")]
    NoPermission,

    #[error("invalid command arguments")]
    InvalidArguments,

    #[error("invalid time: {0}")]
    InvalidTime(String),

    #[error("timer exceeds the maximum of {max} seconds")]
    TimerTooLong { max: u32 },

    #[error("timed auto-disable is turned off")]
    TimersDisabled,
}

/// Reply to a tier change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierChange {
    pub tier: Tier,
    pub variant: VariantId,
    /// Catalog key of the variant, `Default` for the default appearance.
    pub variant_label: String,
    /// Seconds until auto-disable, `0` when timers are off or the policy is disabled.
    pub timeout_seconds: u32,
}

/// Current settings of an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyView {
    pub tier: Tier,
    pub variant: VariantId,
    /// Effective timeout, `0` when timers are off.
    pub timeout_seconds: u32,
    pub expires_at: Option<Timestamp>,
}

/// Everything the help screen may show to an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpView {
    /// Tiers the actor may select.
    pub tiers: Vec<Tier>,
    /// Variant count of every tier that has variants, present only with the
    /// skins capability.
    pub variant_counts: Option<Vec<(Tier, usize)>>,
    pub timer_enabled: bool,
    pub max_timeout_seconds: u32,
}

impl AutogradeService {
    fn ensure_relevant<A>(&self, authority: &A, actor: ActorId) -> Result<(), CommandError>
    where
        A: CapabilityAuthority + ?Sized,
    {
        if self.gate().has_any_relevant_capability(authority, actor) {
            Ok(())
        } else {
            Err(CommandError::NoPermission)
        }
    }

    fn variant_label(&self, tier: Tier, variant: VariantId) -> String {
        self.catalog
            .variants(tier)
            .iter()
            .find(|v| v.id == variant)
            .map_or_else(|| DEFAULT_VARIANT_LABEL.to_string(), |v| v.key.clone())
    }

    /// Select a tier and, with the skins capability, a 1-based variant index.
    ///
    /// Tier `0` disables the policy.
    pub fn set_tier<A>(
        &mut self,
        authority: &A,
        actor: ActorId,
        tier: Tier,
        variant_index: Option<u32>,
        now: Timestamp,
    ) -> Result<TierChange, CommandError>
    where
        A: CapabilityAuthority + ?Sized,
    {
        self.ensure_relevant(authority, actor)?;
        if tier.is_disabled() {
            self.disable(authority, actor)?;
            return Ok(TierChange {
                tier,
                variant: VariantId::DEFAULT,
                variant_label: DEFAULT_VARIANT_LABEL.to_string(),
                timeout_seconds: 0,
            });
        }
        if !self.gate().can_use_tier(authority, actor, tier) {
            return Err(CommandError::NoPermission);
        }

        let variant = variant_index
            .filter(|&index| self.gate().can_use_variant(authority, actor, tier, index))
            .and_then(|index| self.catalog.resolve_variant(tier, index))
            .map_or(VariantId::DEFAULT, |v| v.id);

        let settings = self.config.timer;
        let (policy, timers) = self.policies.get_or_create(actor);
        policy.set_tier(tier, timers);
        policy.set_variant(variant);
        let timeout_seconds = policy.effective_timeout_seconds(true, &settings, timers, now);

        tracing::debug!(%actor, %tier, variant = variant.0, timeout_seconds, "tier selected");
        Ok(TierChange {
            tier,
            variant,
            variant_label: self.variant_label(tier, variant),
            timeout_seconds,
        })
    }

    /// Turn the policy off. Never creates state.
    pub fn disable<A>(&mut self, authority: &A, actor: ActorId) -> Result<(), CommandError>
    where
        A: CapabilityAuthority + ?Sized,
    {
        self.ensure_relevant(authority, actor)?;
        if let Some((policy, timers)) = self.policies.existing_mut(actor) {
            policy.set_tier(Tier::DISABLED, timers);
            policy.set_variant(VariantId::DEFAULT);
            tracing::debug!(%actor, "policy disabled");
        }
        Ok(())
    }

    /// Store the actor's own auto-disable timeout.
    ///
    /// The running countdown is left alone; the new value applies from the
    /// next re-arm.
    pub fn set_timeout<A>(
        &mut self,
        authority: &A,
        actor: ActorId,
        seconds: i64,
    ) -> Result<u32, CommandError>
    where
        A: CapabilityAuthority + ?Sized,
    {
        self.ensure_relevant(authority, actor)?;
        let settings = self.config.timer;
        if !settings.enabled {
            return Err(CommandError::TimersDisabled);
        }
        if seconds <= 0 {
            return Err(CommandError::InvalidTime(seconds.to_string()));
        }
        let seconds = u32::try_from(seconds)
            .ok()
            .filter(|s| *s <= settings.max_seconds)
            .ok_or(CommandError::TimerTooLong {
                max: settings.max_seconds,
            })?;

        let (policy, _) = self.policies.get_or_create(actor);
        policy.set_timeout(seconds);
        Ok(seconds)
    }

    /// Step to the next permitted tier, wrapping from the top back to wood.
    pub fn cycle_tier<A>(
        &mut self,
        authority: &A,
        actor: ActorId,
        now: Timestamp,
    ) -> Result<TierChange, CommandError>
    where
        A: CapabilityAuthority + ?Sized,
    {
        self.ensure_relevant(authority, actor)?;
        let current = self
            .policies
            .get(actor)
            .map_or(Tier::DISABLED, |p| p.tier());

        let mut candidate = current.next_wrapping();
        let mut next = None;
        for _ in 0..MAX_TIER {
            if self.gate().can_use_tier(authority, actor, candidate) {
                next = Some(candidate);
                break;
            }
            candidate = candidate.next_wrapping();
        }
        let tier = next.ok_or(CommandError::NoPermission)?;

        self.set_tier(authority, actor, tier, None, now)
    }

    /// Current settings, if the actor ever created a policy.
    #[must_use]
    pub fn policy_view(&self, actor: ActorId) -> Option<PolicyView> {
        let policy = self.policies.get(actor)?;
        let timer = self.config.timer;
        let timeout_seconds = if timer.enabled {
            policy.configured_timeout().unwrap_or(timer.default_seconds)
        } else {
            0
        };
        Some(PolicyView {
            tier: policy.tier(),
            variant: policy.variant(),
            timeout_seconds,
            expires_at: self.policies.pending_expiry(actor),
        })
    }

    /// Help content tailored to the actor's capabilities.
    pub fn help_view<A>(&self, authority: &A, actor: ActorId) -> Result<HelpView, CommandError>
    where
        A: CapabilityAuthority + ?Sized,
    {
        self.ensure_relevant(authority, actor)?;
        let tiers: Vec<Tier> = Tier::usable()
            .filter(|tier| self.gate().can_use_tier(authority, actor, *tier))
            .collect();
        if tiers.is_empty() && !self.gate().has_all_tiers(authority, actor) {
            return Err(CommandError::NoPermission);
        }

        let variant_counts = self.gate().has_skins(authority, actor).then(|| {
            self.catalog
                .tiers()
                .map(|(tier, entry)| (tier, entry.variants.len()))
                .filter(|(_, count)| *count > 0)
                .collect()
        });

        Ok(HelpView {
            tiers,
            variant_counts,
            timer_enabled: self.config.timer.enabled,
            max_timeout_seconds: self.config.timer.max_seconds,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
