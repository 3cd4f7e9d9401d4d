//! # API Request/Response Types
//!
//! JSON structures for the event bridge.

use crate::runtime::RuntimeStats;
use crate::sandbox::OutboxEntry;
use autograde_core::{ActorId, DamageKind, PlacementKind, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// HEALTH / STATUS
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Service status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Seconds on the service clock.
    pub now: Timestamp,
    #[serde(flatten)]
    pub stats: RuntimeStats,
}

// =============================================================================
// ACTORS
// =============================================================================

fn default_true() -> bool {
    true
}

/// Register or update an actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorRequest {
    pub id: ActorId,
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Item short name to amount, e.g. `{"stones": 1000}`.
    #[serde(default)]
    pub items: BTreeMap<String, u64>,
    #[serde(default = "default_true")]
    pub can_build: bool,
}

/// Actor state after registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorResponse {
    pub id: ActorId,
    pub capabilities: Vec<String>,
    pub inventory: BTreeMap<String, u64>,
}

// =============================================================================
// EVENTS
// =============================================================================

fn structural() -> PlacementKind {
    PlacementKind::Structural
}

/// A piece was placed. Position is in millimetres.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub actor: ActorId,
    pub piece: String,
    #[serde(default = "structural")]
    pub kind: PlacementKind,
    pub position: [i64; 3],
}

/// A structure was hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageRequest {
    pub position: [i64; 3],
    pub kind: DamageKind,
    #[serde(default)]
    pub attacker: Option<ActorId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageResponse {
    pub recorded: bool,
}

/// An actor left.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectRequest {
    pub actor: ActorId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectResponse {
    pub destroyed: bool,
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Which command surface a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    #[default]
    Chat,
    Console,
}

/// Run a chat or console command on behalf of an actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub actor: ActorId,
    #[serde(default)]
    pub channel: Channel,
    /// Defaults to the first configured alias of the channel.
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub lines: Vec<String>,
}

// =============================================================================
// TICK
// =============================================================================

/// Advance the service clock and fire what became due.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickRequest {
    #[serde(default)]
    pub advance_seconds: u64,
    /// Also run maintenance (cooldown pruning).
    #[serde(default)]
    pub maintenance: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickResponse {
    pub now: Timestamp,
    pub expired: Vec<ActorId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pruned: Option<usize>,
    pub outbox: Vec<OutboxEntry>,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Body of every non-2xx response produced by a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
