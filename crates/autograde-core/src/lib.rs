//! # autograde-core
//!
//! Placement-time auto-upgrade for structural pieces.
//!
//! An actor sets a standing policy (target tier, optional cosmetic variant,
//! auto-disable timeout). Every structural piece they place afterwards runs
//! through the [`UpgradeDecisionEngine`], which either promotes it, skips it
//! silently, or reports why it was blocked.
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: no async, no network, no wall clock
//! - Deterministic: BTreeMap only, integer arithmetic only
//! - The host world is reached exclusively through the traits in [`host`]
//! - Time is always passed in as an explicit [`Timestamp`]

// =============================================================================
// MODULES
// =============================================================================

pub mod capability;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod cooldown;
pub mod cost;
pub mod engine;
pub mod host;
pub mod policy;
pub mod primitives;
pub mod service;
pub mod timer;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ActorId, AutogradeError, CostLine, DamageInfo, DamageKind, ItemId, LocationKey,
    PieceDefinition, PieceId, PlacedPiece, PlacementEvent, PlacementKind, Tier, TierCost,
    Timestamp, UpgradeCost, VariantId,
};

// =============================================================================
// RE-EXPORTS: Decision Pipeline
// =============================================================================

pub use capability::CapabilityGate;
pub use catalog::{TierCatalog, TierEntry, Variant};
pub use cooldown::DamageCooldownTracker;
pub use cost::CostCatalog;
pub use engine::{BlockReason, Outcome, SkipReason, UpgradeDecisionEngine};
pub use host::{CapabilityAuthority, HookVerdict, Host, Inventory, Notice, UpgradeHooks, World};
pub use policy::{PolicyRegistry, PolicyState};
pub use timer::{TimerHandle, TimerQueue};

// =============================================================================
// RE-EXPORTS: Service
// =============================================================================

pub use commands::{CommandError, HelpView, PolicyView, TierChange};
pub use config::AutogradeConfig;
pub use service::AutogradeService;
