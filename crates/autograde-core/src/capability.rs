//! # Capability Gate
//!
//! Pure permission queries against an external [`CapabilityAuthority`].
//!
//! Capabilities are namespaced as `<prefix>.<suffix>`:
//!
//! | Suffix | Grants |
//! |--------|--------|
//! | `1`..`4` | that tier |
//! | `all` | every tier |
//! | `nores` | upgrades without paying resources |
//! | `skins` | cosmetic variant selection |

use crate::host::CapabilityAuthority;
use crate::primitives::{CAPABILITY_ALL, CAPABILITY_NO_COST, CAPABILITY_SKINS};
use crate::{ActorId, Tier};

/// Resolves what an actor may do.
#[derive(Debug, Clone)]
pub struct CapabilityGate {
    all: String,
    no_cost: String,
    skins: String,
    /// Per-tier names, index = tier value - 1.
    tiers: Vec<String>,
}

impl CapabilityGate {
    /// Create a gate for a capability namespace.
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        let prefix = prefix.to_lowercase();
        Self {
            all: format!("{prefix}.{CAPABILITY_ALL}"),
            no_cost: format!("{prefix}.{CAPABILITY_NO_COST}"),
            skins: format!("{prefix}.{CAPABILITY_SKINS}"),
            tiers: Tier::usable()
                .map(|tier| format!("{prefix}.{tier}"))
                .collect(),
        }
    }

    /// Every capability name this gate recognizes.
    pub fn registered(&self) -> impl Iterator<Item = &str> {
        self.tiers
            .iter()
            .chain([&self.no_cost, &self.all, &self.skins])
            .map(String::as_str)
    }

    /// Fully qualified name of a tier capability.
    #[must_use]
    pub fn tier_capability(&self, tier: Tier) -> Option<&str> {
        let index = usize::from(tier.value()).checked_sub(1)?;
        self.tiers.get(index).map(String::as_str)
    }

    /// Wildcard first, then the numbered capability for `tier`.
    pub fn can_use_tier<A>(&self, authority: &A, actor: ActorId, tier: Tier) -> bool
    where
        A: CapabilityAuthority + ?Sized,
    {
        if authority.has_capability(actor, &self.all) {
            return true;
        }
        self.tier_capability(tier)
            .is_some_and(|name| authority.has_capability(actor, name))
    }

    /// Tier access plus, for any non-default index, the skins capability.
    pub fn can_use_variant<A>(
        &self,
        authority: &A,
        actor: ActorId,
        tier: Tier,
        variant_index: u32,
    ) -> bool
    where
        A: CapabilityAuthority + ?Sized,
    {
        if !self.can_use_tier(authority, actor, tier) {
            return false;
        }
        variant_index == 0 || self.has_skins(authority, actor)
    }

    /// Check the skins capability alone.
    pub fn has_skins<A>(&self, authority: &A, actor: ActorId) -> bool
    where
        A: CapabilityAuthority + ?Sized,
    {
        authority.has_capability(actor, &self.skins)
    }

    /// Check the no-cost privilege.
    pub fn has_no_cost_privilege<A>(&self, authority: &A, actor: ActorId) -> bool
    where
        A: CapabilityAuthority + ?Sized,
    {
        authority.has_capability(actor, &self.no_cost)
    }

    /// Check the wildcard capability alone.
    pub fn has_all_tiers<A>(&self, authority: &A, actor: ActorId) -> bool
    where
        A: CapabilityAuthority + ?Sized,
    {
        authority.has_capability(actor, &self.all)
    }

    /// Fast reject: does the actor hold anything this gate recognizes?
    pub fn has_any_relevant_capability<A>(&self, authority: &A, actor: ActorId) -> bool
    where
        A: CapabilityAuthority + ?Sized,
    {
        self.registered()
            .any(|name| authority.has_capability(actor, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    struct Grants(BTreeSet<String>);

    impl Grants {
        fn of(names: &[&str]) -> Self {
            Self(names.iter().map(|n| (*n).to_string()).collect())
        }
    }

    impl CapabilityAuthority for Grants {
        fn has_capability(&self, _actor: ActorId, name: &str) -> bool {
            self.0.contains(name)
        }
    }

    const ACTOR: ActorId = ActorId(7);

    #[test]
    fn wildcard_grants_every_tier() {
        let gate = CapabilityGate::new("bgrade");
        let grants = Grants::of(&["bgrade.all"]);

        assert!(Tier::usable().all(|t| gate.can_use_tier(&grants, ACTOR, t)));
    }

    #[test]
    fn numbered_capability_grants_only_its_tier() {
        let gate = CapabilityGate::new("bgrade");
        let grants = Grants::of(&["bgrade.2"]);

        assert!(gate.can_use_tier(&grants, ACTOR, Tier::STONE));
        assert!(!gate.can_use_tier(&grants, ACTOR, Tier::METAL));
        assert!(!gate.can_use_tier(&grants, ACTOR, Tier::DISABLED));
    }

    #[test]
    fn variant_needs_skins_and_tier() {
        let gate = CapabilityGate::new("bgrade");

        let tier_only = Grants::of(&["bgrade.2"]);
        assert!(gate.can_use_variant(&tier_only, ACTOR, Tier::STONE, 0));
        assert!(!gate.can_use_variant(&tier_only, ACTOR, Tier::STONE, 1));

        let skins_only = Grants::of(&["bgrade.skins"]);
        assert!(!gate.can_use_variant(&skins_only, ACTOR, Tier::STONE, 1));

        let both = Grants::of(&["bgrade.2", "bgrade.skins"]);
        assert!(gate.can_use_variant(&both, ACTOR, Tier::STONE, 1));
    }

    #[test]
    fn any_relevant_capability() {
        let gate = CapabilityGate::new("BGrade");

        assert!(!gate.has_any_relevant_capability(&Grants::of(&[]), ACTOR));
        assert!(!gate.has_any_relevant_capability(&Grants::of(&["other.all"]), ACTOR));
        for name in ["bgrade.nores", "bgrade.skins", "bgrade.4", "bgrade.all"] {
            assert!(gate.has_any_relevant_capability(&Grants::of(&[name]), ACTOR));
        }
    }

    #[test]
    fn registered_names() {
        let gate = CapabilityGate::new("bgrade");
        let names: Vec<_> = gate.registered().collect();
        assert_eq!(
            names,
            vec![
                "bgrade.1",
                "bgrade.2",
                "bgrade.3",
                "bgrade.4",
                "bgrade.nores",
                "bgrade.all",
                "bgrade.skins"
            ]
        );
    }
}
