//! # Cost Catalog
//!
//! Resolves what an upgrade costs from the piece's own tier-cost table.

use crate::host::Inventory;
use crate::{ActorId, AutogradeError, PieceDefinition, Tier, UpgradeCost};

/// Stateless cost resolver.
pub struct CostCatalog;

impl CostCatalog {
    /// Cost of building `definition` at `tier`, folded by item.
    ///
    /// Scans the tier-cost entries in order and takes the first whose tier
    /// matches. A missing entry is an authoring-data inconsistency.
    pub fn cost_for(definition: &PieceDefinition, tier: Tier) -> Result<UpgradeCost, AutogradeError> {
        let entry = definition
            .tiers
            .iter()
            .flatten()
            .find(|entry| entry.tier == tier)
            .ok_or_else(|| AutogradeError::CostNotFound {
                piece: definition.name.clone(),
                tier,
            })?;

        let mut cost = UpgradeCost::new();
        for line in &entry.lines {
            cost.add(line.item, u64::from(line.amount));
        }
        Ok(cost)
    }

    /// Check every line of `cost` against the actor's holdings.
    pub fn can_afford<I>(inventory: &I, actor: ActorId, cost: &UpgradeCost) -> bool
    where
        I: Inventory + ?Sized,
    {
        cost.iter()
            .all(|(item, amount)| inventory.item_amount(actor, item) >= amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CostLine, ItemId, TierCost};
    use std::collections::BTreeMap;

    const STONE: ItemId = ItemId(-2099697608);
    const WOOD: ItemId = ItemId(-151838493);

    fn wall() -> PieceDefinition {
        PieceDefinition::new("wall")
            .with_tier(TierCost {
                tier: Tier::WOOD,
                lines: vec![CostLine::new(WOOD, 200)],
            })
            .with_tier(TierCost {
                tier: Tier::STONE,
                lines: vec![CostLine::new(STONE, 200), CostLine::new(STONE, 100)],
            })
    }

    struct Holdings(BTreeMap<ItemId, u64>);

    impl Inventory for Holdings {
        fn item_amount(&self, _actor: ActorId, item: ItemId) -> u64 {
            self.0.get(&item).copied().unwrap_or(0)
        }
        fn take_items(&mut self, _actor: ActorId, _cost: &UpgradeCost) {}
        fn give_item(&mut self, _actor: ActorId, _item: ItemId, _amount: u64) {}
    }

    #[test]
    fn folds_duplicate_lines() {
        let cost = CostCatalog::cost_for(&wall(), Tier::STONE).expect("cost");
        assert_eq!(cost.len(), 1);
        assert_eq!(cost.amount_of(STONE), 300);
    }

    #[test]
    fn missing_tier_is_not_found() {
        let result = CostCatalog::cost_for(&wall(), Tier::METAL);
        assert!(matches!(
            result,
            Err(AutogradeError::CostNotFound { tier, .. }) if tier == Tier::METAL
        ));
    }

    #[test]
    fn mislabelled_slot_is_not_found() {
        // Slot 3 exists but is authored as tier 2.
        let mut def = wall();
        def.tiers.push(Some(TierCost {
            tier: Tier::STONE,
            lines: vec![],
        }));
        assert!(def.has_tier_slot(Tier::METAL));
        assert!(CostCatalog::cost_for(&def, Tier::METAL).is_err());
    }

    #[test]
    fn affordability_checks_every_line() {
        let mut cost = UpgradeCost::new();
        cost.add(STONE, 300);
        cost.add(WOOD, 50);

        let rich = Holdings(BTreeMap::from([(STONE, 300), (WOOD, 50)]));
        let poor = Holdings(BTreeMap::from([(STONE, 1000), (WOOD, 49)]));

        assert!(CostCatalog::can_afford(&rich, ActorId(1), &cost));
        assert!(!CostCatalog::can_afford(&poor, ActorId(1), &cost));
    }
}
