//! # Runtime
//!
//! One running service bound to one sandbox world. Every inbound event of the
//! scenario runner and the HTTP bridge goes through here.
//!
//! The runtime never reads a clock; callers pass `now`.

use crate::chat::CommandLayer;
use crate::error::AppError;
use crate::lang::Lang;
use crate::sandbox::{self, OutboxEntry, Sandbox};
use autograde_core::{
    ActorId, AutogradeConfig, AutogradeService, DamageInfo, LocationKey, Outcome, PieceId,
    PlacementKind, Tier, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Result of one placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementReport {
    pub piece: PieceId,
    pub outcome: Outcome,
    /// Final tier of the piece, `None` if it was removed.
    pub tier: Option<Tier>,
    /// The base placement cost was waived (no-cost privilege, armed policy).
    pub cost_waived: bool,
    pub outbox: Vec<OutboxEntry>,
}

/// Counters for status displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStats {
    pub running: bool,
    pub policies: usize,
    pub pending_timers: usize,
    pub cooldowns: usize,
    pub pieces: usize,
}

/// Service + sandbox world.
#[derive(Debug)]
pub struct Runtime {
    service: AutogradeService,
    sandbox: Sandbox,
    lang: Arc<Lang>,
}

impl Runtime {
    /// Build and start a runtime.
    pub fn new(config: AutogradeConfig, lang: Arc<Lang>) -> Result<Self, AppError> {
        let mut service = AutogradeService::new(config)?;
        service.start();
        Ok(Self {
            service,
            sandbox: Sandbox::new(Arc::clone(&lang)),
            lang,
        })
    }

    #[must_use]
    pub fn service(&self) -> &AutogradeService {
        &self.service
    }

    #[must_use]
    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn sandbox_mut(&mut self) -> &mut Sandbox {
        &mut self.sandbox
    }

    #[must_use]
    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            running: self.service.is_running(),
            policies: self.service.policies().len(),
            pending_timers: self.service.policies().pending_timers(),
            cooldowns: self.service.cooldowns().len(),
            pieces: self.sandbox.pieces().count(),
        }
    }

    // =========================================================================
    // ACTORS
    // =========================================================================

    /// Set up an actor's capabilities, items and build rights.
    pub fn register_actor(
        &mut self,
        actor: ActorId,
        capabilities: &[String],
        items: &BTreeMap<String, u64>,
        can_build: bool,
    ) -> Result<(), AppError> {
        let resolved = items
            .iter()
            .map(|(name, amount)| sandbox::item_id(name).map(|id| (id, *amount)))
            .collect::<Result<Vec<_>, _>>()?;

        self.sandbox
            .set_capabilities(actor, capabilities.iter().cloned());
        for (item, amount) in resolved {
            self.sandbox.set_item(actor, item, amount);
        }
        self.sandbox.set_can_build(actor, can_build);
        Ok(())
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Place a piece and run the upgrade pipeline.
    pub fn place(
        &mut self,
        actor: ActorId,
        piece: &str,
        kind: PlacementKind,
        location: LocationKey,
        now: Timestamp,
    ) -> Result<PlacementReport, AppError> {
        let cost_waived = self.service.waives_placement_cost(&self.sandbox, actor, kind);
        let event = self.sandbox.place(actor, piece, kind, location)?;
        let outcome = self.service.on_placement(&mut self.sandbox, &event, now);
        let id = event.piece.id;
        Ok(PlacementReport {
            piece: id,
            outcome,
            tier: self.sandbox.piece(id).map(|p| p.tier),
            cost_waived,
            outbox: self.sandbox.drain_outbox(),
        })
    }

    /// A structure took damage.
    pub fn damage(&mut self, location: LocationKey, damage: DamageInfo, now: Timestamp) -> bool {
        self.service.on_structure_damaged(location, damage, now)
    }

    /// An actor left.
    pub fn disconnect(&mut self, actor: ActorId) -> bool {
        self.service.on_actor_disconnected(actor)
    }

    /// Run a chat command under one of the configured aliases.
    pub fn chat(
        &mut self,
        actor: ActorId,
        alias: &str,
        args: &[&str],
        now: Timestamp,
    ) -> Result<Vec<String>, AppError> {
        let alias = alias.trim_start_matches('/').to_lowercase();
        if !self.service.config().commands.chat.contains(&alias) {
            return Err(AppError::Unknown {
                kind: "chat command",
                name: alias,
            });
        }
        let layer = CommandLayer::new(&self.lang);
        Ok(layer.chat(&mut self.service, &self.sandbox, actor, &alias, args, now))
    }

    /// Run a console command under one of the configured aliases.
    pub fn console(
        &mut self,
        actor: ActorId,
        alias: &str,
        now: Timestamp,
    ) -> Result<Vec<String>, AppError> {
        let alias = alias.to_lowercase();
        if !self.service.config().commands.console.contains(&alias) {
            return Err(AppError::Unknown {
                kind: "console command",
                name: alias,
            });
        }
        let layer = CommandLayer::new(&self.lang);
        Ok(layer.console(&mut self.service, &self.sandbox, actor, now))
    }

    /// Fire due policy timers.
    pub fn fire_timers(&mut self, now: Timestamp) -> Vec<ActorId> {
        self.service.fire_due_timers(&mut self.sandbox, now)
    }

    /// Periodic maintenance. Returns pruned cooldown entries.
    pub fn maintenance(&mut self, now: Timestamp) -> usize {
        self.service.on_maintenance_tick(now)
    }

    /// Take everything the sandbox sent since the last drain.
    pub fn drain_outbox(&mut self) -> Vec<OutboxEntry> {
        self.sandbox.drain_outbox()
    }

    /// Stop the service and drop its state.
    pub fn shutdown(&mut self) {
        self.service.stop();
    }
}
