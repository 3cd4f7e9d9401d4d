//! # API Endpoint Handlers

use super::{
    AppState,
    types::{
        ActorRequest, ActorResponse, Channel, CommandRequest, CommandResponse, DamageRequest,
        DamageResponse, DisconnectRequest, DisconnectResponse, ErrorResponse, HealthResponse,
        PlacementRequest, StatusResponse, TickRequest, TickResponse,
    },
};
use crate::error::AppError;
use crate::runtime::PlacementReport;
use autograde_core::{DamageInfo, LocationKey};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

type HandlerResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn rejected(error: AppError) -> (StatusCode, Json<ErrorResponse>) {
    tracing::debug!(%error, "request rejected");
    let status = match &error {
        AppError::Unknown { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(ErrorResponse::new(error.to_string())))
}

fn location([x, y, z]: [i64; 3]) -> LocationKey {
    LocationKey::from_millimetres(x, y, z)
}

// =============================================================================
// HEALTH / STATUS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Counters of the running service.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let runtime = state.runtime.read().await;
    let response = StatusResponse {
        now: state.clock.now(),
        stats: runtime.stats(),
    };
    (StatusCode::OK, Json(response))
}

// =============================================================================
// ACTORS
// =============================================================================

/// Register an actor's capabilities, items and build rights.
pub async fn actor_handler(
    State(state): State<AppState>,
    Json(request): Json<ActorRequest>,
) -> HandlerResult<ActorResponse> {
    let mut runtime = state.runtime.write().await;
    runtime
        .register_actor(
            request.id,
            &request.capabilities,
            &request.items,
            request.can_build,
        )
        .map_err(rejected)?;

    Ok(Json(ActorResponse {
        id: request.id,
        capabilities: runtime.sandbox().capabilities(request.id),
        inventory: runtime.sandbox().inventory(request.id),
    }))
}

// =============================================================================
// EVENTS
// =============================================================================

/// Place a piece and run the upgrade pipeline.
pub async fn placement_handler(
    State(state): State<AppState>,
    Json(request): Json<PlacementRequest>,
) -> HandlerResult<PlacementReport> {
    let (mut runtime, now) = state.lock_at().await;
    runtime.fire_timers(now);
    runtime
        .place(
            request.actor,
            &request.piece,
            request.kind,
            location(request.position),
            now,
        )
        .map(Json)
        .map_err(rejected)
}

/// Report a structure hit.
pub async fn damage_handler(
    State(state): State<AppState>,
    Json(request): Json<DamageRequest>,
) -> impl IntoResponse {
    let damage = DamageInfo {
        majority: request.kind,
        attacker: request.attacker,
    };
    let (mut runtime, now) = state.lock_at().await;
    let recorded = runtime.damage(location(request.position), damage, now);
    Json(DamageResponse { recorded })
}

/// Report a disconnect.
pub async fn disconnect_handler(
    State(state): State<AppState>,
    Json(request): Json<DisconnectRequest>,
) -> impl IntoResponse {
    let destroyed = state.runtime.write().await.disconnect(request.actor);
    Json(DisconnectResponse { destroyed })
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Run a chat or console command.
pub async fn command_handler(
    State(state): State<AppState>,
    Json(request): Json<CommandRequest>,
) -> HandlerResult<CommandResponse> {
    let (mut runtime, now) = state.lock_at().await;
    runtime.fire_timers(now);

    let commands = &runtime.service().config().commands;
    let fallback = match request.channel {
        Channel::Chat => commands.chat.first(),
        Channel::Console => commands.console.first(),
    }
    .cloned()
    .unwrap_or_default();
    let alias = request.alias.unwrap_or(fallback);

    let lines = match request.channel {
        Channel::Chat => {
            let args: Vec<&str> = request.args.iter().map(String::as_str).collect();
            runtime.chat(request.actor, &alias, &args, now)
        }
        Channel::Console => runtime.console(request.actor, &alias, now),
    }
    .map_err(rejected)?;

    Ok(Json(CommandResponse { lines }))
}

// =============================================================================
// TICK
// =============================================================================

/// Advance the clock, fire due timers and optionally run maintenance.
pub async fn tick_handler(
    State(state): State<AppState>,
    Json(request): Json<TickRequest>,
) -> impl IntoResponse {
    let mut runtime = state.runtime.write().await;
    let now = state.clock.advance(request.advance_seconds);
    let expired = runtime.fire_timers(now);
    let pruned = request.maintenance.then(|| runtime.maintenance(now));
    Json(TickResponse {
        now,
        expired,
        pruned,
        outbox: runtime.drain_outbox(),
    })
}
