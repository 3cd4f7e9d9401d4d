//! # Core Type Definitions
//!
//! This module contains the value types shared by every part of the core:
//! - Identifiers (`ActorId`, `PieceId`, `ItemId`, `VariantId`)
//! - Time (`Timestamp`, whole seconds supplied by the host)
//! - Tiers and spatial keys (`Tier`, `LocationKey`)
//! - Piece definitions and placement events
//! - Error types (`AutogradeError`)
//!
//! ## Determinism Guarantees
//!
//! - Integer arithmetic only (no floating-point)
//! - `Ord` on every key type so state lives in `BTreeMap`
//! - Saturating arithmetic for time and quantities

use crate::primitives::{LOCATION_GRID_MM, MAX_TIER};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque identity of a connected player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host-assigned identity of a placed structural piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PieceId(pub u64);

/// Resource type identifier used in cost tables and inventories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub i32);

/// Cosmetic variant (skin) identifier. `VariantId::DEFAULT` means none.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct VariantId(pub u64);

impl VariantId {
    /// The default appearance of a tier.
    pub const DEFAULT: Self = Self(0);
}

// =============================================================================
// TIME
// =============================================================================

/// Point in time, in whole seconds, as reported by the host.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Add seconds using saturating arithmetic.
    #[must_use]
    pub const fn plus_seconds(self, seconds: u64) -> Self {
        Self(self.0.saturating_add(seconds))
    }

    /// Get the raw seconds value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

// =============================================================================
// TIER
// =============================================================================

/// Material tier, always within `0..=MAX_TIER`.
///
/// Tier `0` means "disabled" when stored in a policy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
    /// The disabled tier.
    pub const DISABLED: Self = Self(0);
    /// Wood.
    pub const WOOD: Self = Self(1);
    /// Stone.
    pub const STONE: Self = Self(2);
    /// Metal.
    pub const METAL: Self = Self(3);
    /// Top tier.
    pub const TOP: Self = Self(MAX_TIER);

    /// Create a tier, rejecting values above `MAX_TIER`.
    pub fn new(value: u8) -> Result<Self, AutogradeError> {
        if value > MAX_TIER {
            return Err(AutogradeError::InvalidTier(i64::from(value)));
        }
        Ok(Self(value))
    }

    /// Get the raw tier value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Check if this is the disabled tier.
    #[must_use]
    pub const fn is_disabled(self) -> bool {
        self.0 == 0
    }

    /// All usable tiers, lowest first.
    pub fn usable() -> impl Iterator<Item = Tier> {
        (1..=MAX_TIER).map(Self)
    }

    /// The next usable tier, wrapping from the top tier back to wood.
    #[must_use]
    pub const fn next_wrapping(self) -> Self {
        if self.0 >= MAX_TIER {
            Self(1)
        } else {
            Self(self.0 + 1)
        }
    }
}

impl TryFrom<u8> for Tier {
    type Error = AutogradeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.0
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// LOCATION
// =============================================================================

/// Quantized spatial fingerprint of a structure position.
///
/// Positions arrive in integer millimetres and are rounded to a
/// `LOCATION_GRID_MM` grid per axis, so a piece rebuilt at the same spot maps
/// to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocationKey {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl LocationKey {
    /// Quantize a millimetre position.
    #[must_use]
    pub fn from_millimetres(x: i64, y: i64, z: i64) -> Self {
        Self {
            x: quantize(x),
            y: quantize(y),
            z: quantize(z),
        }
    }
}

fn quantize(mm: i64) -> i64 {
    mm.saturating_add(LOCATION_GRID_MM / 2)
        .div_euclid(LOCATION_GRID_MM)
}

// =============================================================================
// COSTS
// =============================================================================

/// A single line of a tier's build cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostLine {
    pub item: ItemId,
    pub amount: u32,
}

impl CostLine {
    /// Create a new cost line.
    #[must_use]
    pub const fn new(item: ItemId, amount: u32) -> Self {
        Self { item, amount }
    }
}

/// Authoring data: what it costs to build a piece at one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCost {
    pub tier: Tier,
    pub lines: Vec<CostLine>,
}

/// Resources required for one upgrade, folded by item.
///
/// Transient: recomputed for every decision.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpgradeCost(BTreeMap<ItemId, u64>);

impl UpgradeCost {
    /// Create an empty cost.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a quantity of an item, summing with any existing line.
    pub fn add(&mut self, item: ItemId, amount: u64) {
        let entry = self.0.entry(item).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Required quantity of an item (0 if absent).
    #[must_use]
    pub fn amount_of(&self, item: ItemId) -> u64 {
        self.0.get(&item).copied().unwrap_or(0)
    }

    /// Iterate lines in item order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, u64)> + '_ {
        self.0.iter().map(|(item, amount)| (*item, *amount))
    }

    /// Number of distinct items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if nothing is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// PIECES & PLACEMENT
// =============================================================================

/// Static definition of a structural piece type.
///
/// `tiers` is indexed by tier value; an empty slot means the piece cannot be
/// built at that tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceDefinition {
    pub name: String,
    pub tiers: Vec<Option<TierCost>>,
}

impl PieceDefinition {
    /// Create a definition with no tier slots.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tiers: Vec::new(),
        }
    }

    /// Builder: fill the slot for `cost.tier`.
    #[must_use]
    pub fn with_tier(mut self, cost: TierCost) -> Self {
        let index = usize::from(cost.tier.value());
        if self.tiers.len() <= index {
            self.tiers.resize(index + 1, None);
        }
        self.tiers[index] = Some(cost);
        self
    }

    /// Check if the slot for `tier` is populated.
    #[must_use]
    pub fn has_tier_slot(&self, tier: Tier) -> bool {
        self.tiers
            .get(usize::from(tier.value()))
            .is_some_and(Option::is_some)
    }
}

/// A piece that has just been placed in the world.
#[derive(Debug, Clone)]
pub struct PlacedPiece {
    pub id: PieceId,
    pub definition: Arc<PieceDefinition>,
    /// Tier the piece was placed at.
    pub tier: Tier,
    pub location: LocationKey,
}

/// What the planner placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementKind {
    /// Foundations, walls, floors: participates in auto-upgrade.
    Structural,
    /// Decorative or deployable items: never upgraded.
    Deployable,
}

/// Inbound event: an actor placed something.
#[derive(Debug, Clone)]
pub struct PlacementEvent {
    pub actor: ActorId,
    pub kind: PlacementKind,
    pub piece: PlacedPiece,
}

// =============================================================================
// DAMAGE
// =============================================================================

/// Majority damage type of a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageKind {
    Explosion,
    Bullet,
    Melee,
    Fire,
    Other,
}

/// Damage report attached to a structure hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageInfo {
    pub majority: DamageKind,
    /// The player responsible, if attributable.
    pub attacker: Option<ActorId>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by the core.
///
/// Expected non-eligibility is never an error; it is reported through
/// [`crate::engine::Outcome`] instead.
#[derive(Debug, Error)]
pub enum AutogradeError {
    /// A tier value outside `0..=MAX_TIER`.
    #[error("Invalid tier: {0}")]
    InvalidTier(i64),

    /// Authoring-data inconsistency: no cost entry for a tier.
    #[error("No cost to build {piece} at tier {tier}")]
    CostNotFound { piece: String, tier: Tier },

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// =============================================================================
// TESTS
// =============================================================================
