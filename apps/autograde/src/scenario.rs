//! # Scenario Runner
//!
//! Replays a scripted session against a fresh [`Runtime`] and records a
//! transcript.
//!
//! ```json
//! {
//!   "actors": [{ "id": 1, "capabilities": ["bgrade.2"], "items": { "stones": 1000 } }],
//!   "steps": [
//!     { "at": 0, "action": "chat", "actor": 1, "args": ["2"] },
//!     { "at": 5, "action": "place", "actor": 1, "piece": "foundation", "position": [0, 0, 0] },
//!     { "at": 40, "action": "tick" }
//!   ]
//! }
//! ```
//!
//! Steps must be in non-decreasing time order. Due policy timers fire before
//! each step runs.

use crate::error::AppError;
use crate::lang::Lang;
use crate::runtime::{PlacementReport, Runtime};
use crate::sandbox::{OutboxEntry, PieceRecord};
use autograde_core::{
    ActorId, AutogradeConfig, DamageInfo, DamageKind, HookVerdict, LocationKey, PlacementKind,
    Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Maximum scenario file size (10 MB).
const MAX_SCENARIO_FILE_SIZE: u64 = 10 * 1024 * 1024;

// =============================================================================
// SCENARIO FORMAT
// =============================================================================

/// An actor present from the start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorSetup {
    pub id: ActorId,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub items: BTreeMap<String, u64>,
    #[serde(default = "default_true")]
    pub can_build: bool,
}

fn default_true() -> bool {
    true
}

/// One scripted action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Place {
        actor: ActorId,
        piece: String,
        #[serde(default = "structural")]
        kind: PlacementKind,
        /// Millimetres.
        position: [i64; 3],
    },
    Damage {
        position: [i64; 3],
        kind: DamageKind,
        #[serde(default)]
        attacker: Option<ActorId>,
    },
    Disconnect {
        actor: ActorId,
    },
    Chat {
        actor: ActorId,
        #[serde(default)]
        alias: Option<String>,
        #[serde(default)]
        args: Vec<String>,
    },
    Console {
        actor: ActorId,
        #[serde(default)]
        alias: Option<String>,
    },
    /// Advance time only; due timers fire.
    Tick,
    /// Periodic maintenance (world save).
    Save,
    /// Script the third-party hooks from here on.
    Hooks {
        #[serde(default)]
        can_upgrade: HookVerdict,
        #[serde(default)]
        on_structure_upgrade: HookVerdict,
    },
}

fn structural() -> PlacementKind {
    PlacementKind::Structural
}

/// A timed action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub at: u64,
    #[serde(flatten)]
    pub action: Action,
}

/// A complete scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Overrides the loaded configuration when present.
    #[serde(default)]
    pub config: Option<AutogradeConfig>,
    #[serde(default)]
    pub actors: Vec<ActorSetup>,
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Read a scenario from a JSON file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let metadata = std::fs::metadata(path)?;
        if metadata.len() > MAX_SCENARIO_FILE_SIZE {
            return Err(AppError::Scenario(format!(
                "File size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_SCENARIO_FILE_SIZE
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

// =============================================================================
// TRANSCRIPT
// =============================================================================

/// What a step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepResult {
    Placement(PlacementReport),
    Damage { recorded: bool },
    Disconnect { destroyed: bool },
    Reply { lines: Vec<String> },
    Tick,
    Save { pruned: usize },
    Hooks,
}

/// One transcript line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub at: u64,
    /// Actors whose policy expired before the step ran.
    pub expired: Vec<ActorId>,
    pub result: StepResult,
    /// Host messages and effects produced by the step and by expiry.
    pub outbox: Vec<OutboxEntry>,
}

/// Full run record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub entries: Vec<TranscriptEntry>,
    pub pieces: Vec<PieceRecord>,
}

// =============================================================================
// RUNNER
// =============================================================================

/// Run a scenario. The scenario's own config, if any, wins over `config`.
pub fn run(
    scenario: &Scenario,
    config: AutogradeConfig,
    lang: Arc<Lang>,
) -> Result<Transcript, AppError> {
    let config = scenario.config.clone().unwrap_or(config);
    let default_chat = config.commands.chat.first().cloned().unwrap_or_default();
    let default_console = config.commands.console.first().cloned().unwrap_or_default();

    let mut runtime = Runtime::new(config, lang)?;
    for actor in &scenario.actors {
        runtime.register_actor(actor.id, &actor.capabilities, &actor.items, actor.can_build)?;
    }

    let mut entries = Vec::with_capacity(scenario.steps.len());
    let mut last = 0;
    for (index, step) in scenario.steps.iter().enumerate() {
        if step.at < last {
            return Err(AppError::Scenario(format!(
                "step {} at {} runs before the previous step at {}",
                index, step.at, last
            )));
        }
        last = step.at;
        let now = Timestamp(step.at);

        let expired = runtime.fire_timers(now);
        let result = match &step.action {
            Action::Place {
                actor,
                piece,
                kind,
                position,
            } => {
                let [x, y, z] = *position;
                let at = LocationKey::from_millimetres(x, y, z);
                let mut report = runtime.place(*actor, piece, *kind, at, now)?;
                // The placement drained the outbox, expiry notices included.
                let outbox = std::mem::take(&mut report.outbox);
                entries.push(TranscriptEntry {
                    at: step.at,
                    expired,
                    result: StepResult::Placement(report),
                    outbox,
                });
                continue;
            }
            Action::Damage {
                position,
                kind,
                attacker,
            } => {
                let [x, y, z] = *position;
                let damage = DamageInfo {
                    majority: *kind,
                    attacker: *attacker,
                };
                StepResult::Damage {
                    recorded: runtime.damage(LocationKey::from_millimetres(x, y, z), damage, now),
                }
            }
            Action::Disconnect { actor } => StepResult::Disconnect {
                destroyed: runtime.disconnect(*actor),
            },
            Action::Chat { actor, alias, args } => {
                let alias = alias.as_deref().unwrap_or(&default_chat);
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                StepResult::Reply {
                    lines: runtime.chat(*actor, alias, &args, now)?,
                }
            }
            Action::Console { actor, alias } => {
                let alias = alias.as_deref().unwrap_or(&default_console);
                StepResult::Reply {
                    lines: runtime.console(*actor, alias, now)?,
                }
            }
            Action::Tick => StepResult::Tick,
            Action::Save => StepResult::Save {
                pruned: runtime.maintenance(now),
            },
            Action::Hooks {
                can_upgrade,
                on_structure_upgrade,
            } => {
                runtime
                    .sandbox_mut()
                    .set_hooks(*can_upgrade, *on_structure_upgrade);
                StepResult::Hooks
            }
        };

        entries.push(TranscriptEntry {
            at: step.at,
            expired,
            result,
            outbox: runtime.drain_outbox(),
        });
    }

    let pieces = runtime.sandbox().pieces().cloned().collect();
    runtime.shutdown();
    Ok(Transcript { entries, pieces })
}
