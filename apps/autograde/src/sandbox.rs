//! # Sandbox Host
//!
//! In-memory implementation of every host collaborator the core needs:
//! capability grants, inventories, placed pieces, build rights, scripted hook
//! verdicts and an outbox of messages and effects.
//!
//! Used by the scenario runner and the HTTP bridge.

use crate::error::AppError;
use crate::lang::{self, Lang};
use autograde_core::{
    ActorId, CapabilityAuthority, CostLine, HookVerdict, Inventory, ItemId, LocationKey, Notice,
    PieceDefinition, PieceId, PlacedPiece, PlacementEvent, PlacementKind, Tier, TierCost,
    UpgradeCost, UpgradeHooks, VariantId, World,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

// =============================================================================
// ITEMS AND PIECES
// =============================================================================

/// Short names of the building resources.
pub const ITEMS: &[(&str, ItemId)] = &[
    ("wood", ItemId(-151_838_493)),
    ("stones", ItemId(-2_099_697_608)),
    ("metal.fragments", ItemId(69_511_070)),
    ("metal.refined", ItemId(317_398_316)),
];

/// Resolve an item short name.
pub fn item_id(name: &str) -> Result<ItemId, AppError> {
    ITEMS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, id)| *id)
        .ok_or_else(|| AppError::Unknown {
            kind: "item",
            name: name.to_string(),
        })
}

/// Short name of an item id, if known.
pub fn item_name(id: ItemId) -> Option<&'static str> {
    ITEMS.iter().find(|(_, i)| *i == id).map(|(n, _)| *n)
}

fn resource(name: &str) -> ItemId {
    item_id(name).unwrap_or(ItemId(0))
}

fn tiered(name: &str) -> PieceDefinition {
    let line = |item: &str, amount: u32| CostLine::new(resource(item), amount);
    let slot = |tier: Tier, lines: Vec<CostLine>| TierCost { tier, lines };

    PieceDefinition::new(name)
        .with_tier(slot(Tier::DISABLED, vec![line("wood", 50)]))
        .with_tier(slot(Tier::WOOD, vec![line("wood", 200)]))
        .with_tier(slot(Tier::STONE, vec![line("stones", 300)]))
        .with_tier(slot(Tier::METAL, vec![line("metal.fragments", 200)]))
        .with_tier(slot(Tier::TOP, vec![line("metal.refined", 25)]))
}

/// Stock piece definitions, keyed by name.
#[must_use]
pub fn standard_definitions() -> BTreeMap<String, Arc<PieceDefinition>> {
    let mut defs = BTreeMap::new();
    for name in ["foundation", "wall", "floor"] {
        defs.insert(name.to_string(), Arc::new(tiered(name)));
    }
    for name in ["half.wall", "floor.triangle", "stairs"] {
        let def = tiered(name);
        let halved = PieceDefinition {
            name: def.name.clone(),
            tiers: def
                .tiers
                .into_iter()
                .map(|slot| {
                    slot.map(|cost| TierCost {
                        tier: cost.tier,
                        lines: cost
                            .lines
                            .into_iter()
                            .map(|l| CostLine::new(l.item, l.amount / 2))
                            .collect(),
                    })
                })
                .collect(),
        };
        defs.insert(name.to_string(), Arc::new(halved));
    }
    // Twig-only piece: cannot be promoted.
    defs.insert(
        "ladder.hatch".to_string(),
        Arc::new(PieceDefinition::new("ladder.hatch").with_tier(TierCost {
            tier: Tier::DISABLED,
            lines: vec![CostLine::new(resource("metal.fragments"), 300)],
        })),
    );
    defs
}

// =============================================================================
// SANDBOX STATE
// =============================================================================

/// A piece living in the sandbox world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceRecord {
    pub id: PieceId,
    pub definition: String,
    pub owner: ActorId,
    pub tier: Tier,
    pub variant: VariantId,
    pub location: LocationKey,
}

/// Something the host sent to an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboxEntry {
    Chat { actor: ActorId, message: String },
    Effect { actor: ActorId, piece: PieceId, tier: Tier },
}

/// The in-memory host.
#[derive(Debug, Clone)]
pub struct Sandbox {
    lang: Arc<Lang>,
    definitions: BTreeMap<String, Arc<PieceDefinition>>,
    grants: BTreeMap<ActorId, BTreeSet<String>>,
    inventories: BTreeMap<ActorId, BTreeMap<ItemId, u64>>,
    build_blocked: BTreeSet<ActorId>,
    pieces: BTreeMap<PieceId, PieceRecord>,
    next_piece: u64,
    can_upgrade: HookVerdict,
    on_structure_upgrade: HookVerdict,
    outbox: Vec<OutboxEntry>,
}

impl Sandbox {
    /// Create an empty world with the stock piece definitions.
    #[must_use]
    pub fn new(lang: Arc<Lang>) -> Self {
        Self {
            lang,
            definitions: standard_definitions(),
            grants: BTreeMap::new(),
            inventories: BTreeMap::new(),
            build_blocked: BTreeSet::new(),
            pieces: BTreeMap::new(),
            next_piece: 0,
            can_upgrade: HookVerdict::NoOpinion,
            on_structure_upgrade: HookVerdict::NoOpinion,
            outbox: Vec::new(),
        }
    }

    // =========================================================================
    // ACTORS
    // =========================================================================

    /// Replace an actor's capability grants.
    pub fn set_capabilities<I, S>(&mut self, actor: ActorId, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = names.into_iter().map(|n| n.into().to_lowercase()).collect();
        self.grants.insert(actor, set);
    }

    /// Capabilities currently granted to an actor.
    #[must_use]
    pub fn capabilities(&self, actor: ActorId) -> Vec<String> {
        self.grants
            .get(&actor)
            .map(|g| g.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Set an actor's holding of an item.
    pub fn set_item(&mut self, actor: ActorId, item: ItemId, amount: u64) {
        self.inventories.entry(actor).or_default().insert(item, amount);
    }

    /// Inventory of an actor, by item short name where known.
    #[must_use]
    pub fn inventory(&self, actor: ActorId) -> BTreeMap<String, u64> {
        self.inventories
            .get(&actor)
            .map(|items| {
                items
                    .iter()
                    .map(|(id, amount)| {
                        let name = item_name(*id).map_or_else(|| id.0.to_string(), str::to_string);
                        (name, *amount)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Allow or deny building for an actor.
    pub fn set_can_build(&mut self, actor: ActorId, allowed: bool) {
        if allowed {
            self.build_blocked.remove(&actor);
        } else {
            self.build_blocked.insert(actor);
        }
    }

    // =========================================================================
    // HOOKS
    // =========================================================================

    /// Script the verdict of both third-party hooks.
    pub fn set_hooks(&mut self, can_upgrade: HookVerdict, on_structure_upgrade: HookVerdict) {
        self.can_upgrade = can_upgrade;
        self.on_structure_upgrade = on_structure_upgrade;
    }

    // =========================================================================
    // PIECES
    // =========================================================================

    /// Place a piece at its base tier and build the event for the core.
    pub fn place(
        &mut self,
        actor: ActorId,
        definition: &str,
        kind: PlacementKind,
        location: LocationKey,
    ) -> Result<PlacementEvent, AppError> {
        let def = self
            .definitions
            .get(definition)
            .cloned()
            .ok_or_else(|| AppError::Unknown {
                kind: "piece",
                name: definition.to_string(),
            })?;

        self.next_piece = self.next_piece.saturating_add(1);
        let id = PieceId(self.next_piece);
        self.pieces.insert(
            id,
            PieceRecord {
                id,
                definition: def.name.clone(),
                owner: actor,
                tier: Tier::DISABLED,
                variant: VariantId::DEFAULT,
                location,
            },
        );

        Ok(PlacementEvent {
            actor,
            kind,
            piece: PlacedPiece {
                id,
                definition: def,
                tier: Tier::DISABLED,
                location,
            },
        })
    }

    /// A piece that is still in the world.
    #[must_use]
    pub fn piece(&self, id: PieceId) -> Option<&PieceRecord> {
        self.pieces.get(&id)
    }

    /// Every piece in the world.
    pub fn pieces(&self) -> impl Iterator<Item = &PieceRecord> {
        self.pieces.values()
    }

    /// Known definition names.
    pub fn definition_names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    // =========================================================================
    // OUTBOX
    // =========================================================================

    /// Take everything sent since the last drain.
    pub fn drain_outbox(&mut self) -> Vec<OutboxEntry> {
        std::mem::take(&mut self.outbox)
    }
}

// =============================================================================
// HOST COLLABORATORS
// =============================================================================

impl CapabilityAuthority for Sandbox {
    fn has_capability(&self, actor: ActorId, name: &str) -> bool {
        self.grants.get(&actor).is_some_and(|g| g.contains(name))
    }
}

impl Inventory for Sandbox {
    fn item_amount(&self, actor: ActorId, item: ItemId) -> u64 {
        self.inventories
            .get(&actor)
            .and_then(|items| items.get(&item))
            .copied()
            .unwrap_or(0)
    }

    fn take_items(&mut self, actor: ActorId, cost: &UpgradeCost) {
        let items = self.inventories.entry(actor).or_default();
        for (item, amount) in cost.iter() {
            let held = items.entry(item).or_insert(0);
            *held = held.saturating_sub(amount);
        }
    }

    fn give_item(&mut self, actor: ActorId, item: ItemId, amount: u64) {
        let held = self.inventories.entry(actor).or_default().entry(item).or_insert(0);
        *held = held.saturating_add(amount);
    }
}

impl World for Sandbox {
    fn can_build(&self, actor: ActorId, _piece: &PlacedPiece) -> bool {
        !self.build_blocked.contains(&actor)
    }

    fn apply_upgrade(&mut self, piece: &PlacedPiece, tier: Tier, variant: VariantId) {
        if let Some(record) = self.pieces.get_mut(&piece.id) {
            record.tier = tier;
            record.variant = variant;
        }
    }

    fn remove_piece(&mut self, piece: &PlacedPiece) {
        self.pieces.remove(&piece.id);
    }

    fn play_upgrade_effect(
        &mut self,
        actor: ActorId,
        piece: &PlacedPiece,
        tier: Tier,
        _variant: VariantId,
    ) {
        self.outbox.push(OutboxEntry::Effect {
            actor,
            piece: piece.id,
            tier,
        });
    }

    fn notify(&mut self, actor: ActorId, notice: Notice) {
        let key = match notice {
            Notice::InsufficientResources => lang::ERROR_RESOURCES,
            Notice::PolicyAutoDisabled => lang::NOTICE_DISABLED_AUTO,
        };
        self.outbox.push(OutboxEntry::Chat {
            actor,
            message: self.lang.text(key),
        });
    }
}

impl UpgradeHooks for Sandbox {
    fn can_upgrade(
        &self,
        _actor: ActorId,
        _tier: Tier,
        _piece: &PlacedPiece,
        _event: &PlacementEvent,
    ) -> HookVerdict {
        self.can_upgrade
    }

    fn on_structure_upgrade(&self, _piece: &PlacedPiece, _actor: ActorId, _tier: Tier) -> HookVerdict {
        self.on_structure_upgrade
    }
}
