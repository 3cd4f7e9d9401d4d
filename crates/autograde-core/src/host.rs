//! # Host Collaborators
//!
//! The core never touches the world directly. Everything it needs from the
//! host simulation is expressed as a trait here:
//!
//! - [`CapabilityAuthority`]: permission queries
//! - [`Inventory`]: resource holdings
//! - [`World`]: build rights, piece mutation, effects and chat delivery
//! - [`UpgradeHooks`]: third-party veto and override points
//!
//! [`Host`] bundles all four and is implemented automatically.

use crate::{ActorId, ItemId, PlacedPiece, PlacementEvent, Tier, UpgradeCost, VariantId};
use serde::{Deserialize, Serialize};

/// External permission authority. Only the query contract is used.
pub trait CapabilityAuthority {
    /// Check if `actor` holds the fully qualified capability `name`.
    fn has_capability(&self, actor: ActorId, name: &str) -> bool;
}

/// Resource holdings of connected actors.
pub trait Inventory {
    /// Total quantity of `item` held by `actor`.
    fn item_amount(&self, actor: ActorId, item: ItemId) -> u64;

    /// Remove every line of `cost` from the actor in a single operation.
    ///
    /// Called at most once per upgrade, and only after affordability of
    /// every line has been confirmed.
    fn take_items(&mut self, actor: ActorId, cost: &UpgradeCost);

    /// Give `amount` of `item` to the actor (refunds).
    fn give_item(&mut self, actor: ActorId, item: ItemId, amount: u64);
}

/// User-visible notices emitted by the core itself.
///
/// Command replies are returned to the caller instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// The actor cannot afford the upgrade.
    InsufficientResources,
    /// The policy timer fired and the policy was turned off.
    PolicyAutoDisabled,
}

/// The host world simulation.
pub trait World {
    /// General build rights of `actor` at the piece's location.
    fn can_build(&self, actor: ActorId, piece: &PlacedPiece) -> bool;

    /// Promote a piece.
    ///
    /// The host sets the tier and variant, restores full integrity for the
    /// new tier, refreshes its upkeep clock and marks the owning structure
    /// for persistence and replication.
    fn apply_upgrade(&mut self, piece: &PlacedPiece, tier: Tier, variant: VariantId);

    /// Destroy a placed piece.
    fn remove_piece(&mut self, piece: &PlacedPiece);

    /// Cosmetic upgrade effect, sent only to the originating actor.
    fn play_upgrade_effect(
        &mut self,
        actor: ActorId,
        piece: &PlacedPiece,
        tier: Tier,
        variant: VariantId,
    );

    /// Deliver a notice to an actor.
    fn notify(&mut self, actor: ActorId, notice: Notice);
}

/// Tagged result of a third-party hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HookVerdict {
    /// Default behavior continues.
    #[default]
    NoOpinion,
    /// Default behavior is cancelled.
    Veto,
    /// Default behavior is replaced by refund-and-remove.
    ///
    /// Codes `<= 0` cancel the upgrade without touching the piece.
    OverrideWithRefundCode(i32),
}

/// Third-party extension points. Both default to [`HookVerdict::NoOpinion`].
pub trait UpgradeHooks {
    /// Called before any eligibility check on the piece itself.
    fn can_upgrade(
        &self,
        _actor: ActorId,
        _tier: Tier,
        _piece: &PlacedPiece,
        _event: &PlacementEvent,
    ) -> HookVerdict {
        HookVerdict::NoOpinion
    }

    /// Called right before resources are charged; anything but
    /// `NoOpinion` cancels the upgrade.
    fn on_structure_upgrade(&self, _piece: &PlacedPiece, _actor: ActorId, _tier: Tier) -> HookVerdict {
        HookVerdict::NoOpinion
    }
}

/// Everything the decision pipeline needs from the host.
pub trait Host: CapabilityAuthority + Inventory + World + UpgradeHooks {}

impl<T: CapabilityAuthority + Inventory + World + UpgradeHooks + ?Sized> Host for T {}
