//! # Tier Catalog
//!
//! Static mapping of each usable tier to its human label and the ordered
//! cosmetic variants selectable within it. Immutable once built.

use crate::{Tier, VariantId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label shown for the default appearance of any tier.
pub const DEFAULT_VARIANT_LABEL: &str = "Default";

/// A selectable cosmetic variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    /// Localization key suffix, e.g. `Brick` for `Words.Brick`.
    pub key: String,
}

impl Variant {
    fn new(id: u64, key: &str) -> Self {
        Self {
            id: VariantId(id),
            key: key.to_string(),
        }
    }
}

/// Label and variants for one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierEntry {
    pub label: String,
    pub variants: Vec<Variant>,
}

/// Catalog of tiers and their variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCatalog {
    entries: BTreeMap<Tier, TierEntry>,
}

impl Default for TierCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl TierCatalog {
    /// Build a catalog from explicit entries.
    #[must_use]
    pub fn new(entries: BTreeMap<Tier, TierEntry>) -> Self {
        Self { entries }
    }

    /// The stock catalog: wood, stone, metal, top tier.
    #[must_use]
    pub fn standard() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            Tier::WOOD,
            TierEntry {
                label: "Wood".to_string(),
                variants: vec![Variant::new(10232, "LegacyWood")],
            },
        );
        entries.insert(
            Tier::STONE,
            TierEntry {
                label: "Stone".to_string(),
                variants: vec![
                    Variant::new(10220, "Adobe"),
                    Variant::new(10223, "Brick"),
                    Variant::new(10225, "Brutalist"),
                ],
            },
        );
        entries.insert(
            Tier::METAL,
            TierEntry {
                label: "Metal".to_string(),
                variants: vec![Variant::new(10221, "ShippingContainer")],
            },
        );
        entries.insert(
            Tier::TOP,
            TierEntry {
                label: "Armoured".to_string(),
                variants: Vec::new(),
            },
        );
        Self { entries }
    }

    /// Human label of a tier, if catalogued.
    #[must_use]
    pub fn label(&self, tier: Tier) -> Option<&str> {
        self.entries.get(&tier).map(|e| e.label.as_str())
    }

    /// Ordered variants of a tier (empty if none or not catalogued).
    #[must_use]
    pub fn variants(&self, tier: Tier) -> &[Variant] {
        self.entries
            .get(&tier)
            .map(|e| e.variants.as_slice())
            .unwrap_or(&[])
    }

    /// Number of variants available for a tier.
    #[must_use]
    pub fn variant_count(&self, tier: Tier) -> usize {
        self.variants(tier).len()
    }

    /// Resolve a 1-based variant index.
    ///
    /// Index `0` and out-of-range indices yield `None` (default appearance).
    #[must_use]
    pub fn resolve_variant(&self, tier: Tier, index: u32) -> Option<&Variant> {
        let position = usize::try_from(index).ok()?.checked_sub(1)?;
        self.variants(tier).get(position)
    }

    /// Iterate catalogued tiers, lowest first.
    pub fn tiers(&self) -> impl Iterator<Item = (Tier, &TierEntry)> {
        self.entries.iter().map(|(tier, entry)| (*tier, entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_variant_counts() {
        let catalog = TierCatalog::standard();
        assert_eq!(catalog.variant_count(Tier::WOOD), 1);
        assert_eq!(catalog.variant_count(Tier::STONE), 3);
        assert_eq!(catalog.variant_count(Tier::METAL), 1);
        assert_eq!(catalog.variant_count(Tier::TOP), 0);
        assert_eq!(catalog.variant_count(Tier::DISABLED), 0);
    }

    #[test]
    fn resolve_variant_is_one_based() {
        let catalog = TierCatalog::standard();

        let brick = catalog.resolve_variant(Tier::STONE, 2).expect("brick");
        assert_eq!(brick.id, VariantId(10223));
        assert_eq!(brick.key, "Brick");

        assert!(catalog.resolve_variant(Tier::STONE, 0).is_none());
        assert!(catalog.resolve_variant(Tier::STONE, 4).is_none());
        assert!(catalog.resolve_variant(Tier::TOP, 1).is_none());
    }

    #[test]
    fn labels() {
        let catalog = TierCatalog::standard();
        assert_eq!(catalog.label(Tier::TOP), Some("Armoured"));
        assert_eq!(catalog.label(Tier::DISABLED), None);
    }
}
