//! Integration tests for the autograde HTTP event bridge.
//!
//! Uses axum-test to drive the router without binding a socket.

// Auth tests hold the env mutex across awaits; they are serialized on purpose.
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use autograde::api::{
    API_KEY_ENV, ActorResponse, AppState, CommandResponse, DamageResponse, DisconnectResponse,
    ErrorResponse, HealthResponse, StatusResponse, TickResponse, create_router,
};
use autograde::lang::Lang;
use autograde::runtime::Runtime;
use autograde_core::{ActorId, AutogradeConfig};
use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode, header};
use axum_test::TestServer;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Serializes tests that touch `AUTOGRADE_API_KEY`.
static AUTH_TEST_MUTEX: Mutex<()> = Mutex::new(());

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var(API_KEY_ENV) };
    }
}

fn state(config: AutogradeConfig) -> AppState {
    AppState::new(Runtime::new(config, Arc::new(Lang::english())).unwrap())
}

fn create_test_server_with(config: AutogradeConfig, api_key: Option<&str>) -> (TestServer, TestGuard) {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe {
        match api_key {
            Some(key) => std::env::set_var(API_KEY_ENV, key),
            None => std::env::remove_var(API_KEY_ENV),
        }
    }
    let router = create_router(state(config));
    (
        TestServer::new(router).unwrap(),
        TestGuard { _guard: guard },
    )
}

fn create_test_server() -> (TestServer, TestGuard) {
    create_test_server_with(AutogradeConfig::default(), None)
}

fn bearer(key: &str) -> HeaderValue {
    format!("Bearer {}", key).parse::<HeaderValue>().unwrap()
}

async fn register_stone_builder(server: &TestServer) {
    server
        .post("/actors")
        .json(&json!({
            "id": 1,
            "capabilities": ["bgrade.2"],
            "items": { "stones": 1000 }
        }))
        .await
        .assert_status_ok();
}

// =============================================================================
// HEALTH / STATUS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_health_through_tower_service() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let router = create_router(state(AutogradeConfig::default()));

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_status_of_fresh_service() {
    let (server, _guard) = create_test_server();

    let status: StatusResponse = server.get("/status").await.json();

    assert!(status.stats.running);
    assert_eq!(status.stats.policies, 0);
    assert_eq!(status.stats.pending_timers, 0);
    assert_eq!(status.stats.pieces, 0);
}

// =============================================================================
// ACTORS
// =============================================================================

#[tokio::test]
async fn test_register_actor_reports_inventory() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/actors")
        .json(&json!({
            "id": 7,
            "capabilities": ["BGrade.All"],
            "items": { "wood": 500, "stones": 20 }
        }))
        .await;

    response.assert_status_ok();
    let actor: ActorResponse = response.json();
    assert_eq!(actor.id, ActorId(7));
    assert_eq!(actor.capabilities, vec!["bgrade.all".to_string()]);
    assert_eq!(actor.inventory.get("wood"), Some(&500));
    assert_eq!(actor.inventory.get("stones"), Some(&20));
}

#[tokio::test]
async fn test_register_actor_with_unknown_item() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/actors")
        .json(&json!({ "id": 7, "items": { "sulfur": 5 } }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let error: ErrorResponse = response.json();
    assert!(error.error.contains("sulfur"));
}

// =============================================================================
// PLACEMENT FLOW
// =============================================================================

#[tokio::test]
async fn test_command_then_placement_upgrades() {
    let (server, _guard) = create_test_server();
    register_stone_builder(&server).await;

    let reply: CommandResponse = server
        .post("/command")
        .json(&json!({ "actor": 1, "args": ["2"] }))
        .await
        .json();
    assert_eq!(reply.lines.len(), 2);
    assert!(reply.lines[0].contains("grade <color=orange>2</color>"));

    let response = server
        .post("/placement")
        .json(&json!({ "actor": 1, "piece": "foundation", "position": [0, 0, 0] }))
        .await;
    response.assert_status_ok();
    let report: Value = response.json();
    assert_eq!(report["tier"], json!(2));
    assert_eq!(report["outcome"]["applied"]["tier"], json!(2));
    assert_eq!(report["outbox"][0]["type"], json!("effect"));

    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.stats.pieces, 1);
    assert_eq!(status.stats.policies, 1);
}

#[tokio::test]
async fn test_placement_without_policy_is_skipped() {
    let (server, _guard) = create_test_server();
    register_stone_builder(&server).await;

    let report: Value = server
        .post("/placement")
        .json(&json!({ "actor": 1, "piece": "wall", "position": [0, 0, 0] }))
        .await
        .json();

    assert_eq!(report["outcome"]["skipped"], json!("no_policy"));
    assert_eq!(report["tier"], json!(0));
}

#[tokio::test]
async fn test_placement_of_unknown_piece() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/placement")
        .json(&json!({ "actor": 1, "piece": "castle", "position": [0, 0, 0] }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_explosion_suppresses_upgrade() {
    let (server, _guard) = create_test_server();
    register_stone_builder(&server).await;
    server
        .post("/command")
        .json(&json!({ "actor": 1, "args": ["2"] }))
        .await
        .assert_status_ok();

    let damage: DamageResponse = server
        .post("/damage")
        .json(&json!({ "position": [1000, 0, 2000], "kind": "explosion", "attacker": 9 }))
        .await
        .json();
    assert!(damage.recorded);

    let report: Value = server
        .post("/placement")
        .json(&json!({ "actor": 1, "piece": "wall", "position": [1000, 0, 2000] }))
        .await
        .json();
    assert_eq!(report["outcome"]["skipped"], json!("suppressed"));
}

#[tokio::test]
async fn test_non_explosive_damage_is_ignored() {
    let (server, _guard) = create_test_server();

    let damage: DamageResponse = server
        .post("/damage")
        .json(&json!({ "position": [0, 0, 0], "kind": "bullet", "attacker": 9 }))
        .await
        .json();

    assert!(!damage.recorded);
}

// =============================================================================
// TIMERS / LIFECYCLE
// =============================================================================

#[tokio::test]
async fn test_tick_fires_expiry_notice() {
    let (server, _guard) = create_test_server();
    register_stone_builder(&server).await;
    server
        .post("/command")
        .json(&json!({ "actor": 1, "args": ["2"] }))
        .await
        .assert_status_ok();

    let tick: TickResponse = server
        .post("/tick")
        .json(&json!({ "advance_seconds": 31 }))
        .await
        .json();

    assert_eq!(tick.expired, vec![ActorId(1)]);
    assert_eq!(tick.outbox.len(), 1);
    assert!(tick.pruned.is_none());

    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.stats.pending_timers, 0);
}

#[tokio::test]
async fn test_tick_with_maintenance_prunes() {
    let (server, _guard) = create_test_server();
    server
        .post("/damage")
        .json(&json!({ "position": [0, 0, 0], "kind": "explosion", "attacker": 9 }))
        .await
        .assert_status_ok();

    let tick: TickResponse = server
        .post("/tick")
        .json(&json!({ "advance_seconds": 60, "maintenance": true }))
        .await
        .json();

    assert_eq!(tick.pruned, Some(1));
}

#[tokio::test]
async fn test_disconnect_keeps_policy_by_default() {
    let (server, _guard) = create_test_server();
    register_stone_builder(&server).await;
    server
        .post("/command")
        .json(&json!({ "actor": 1, "args": ["2"] }))
        .await
        .assert_status_ok();

    let response: DisconnectResponse = server
        .post("/disconnect")
        .json(&json!({ "actor": 1 }))
        .await
        .json();

    assert!(!response.destroyed);
}

#[tokio::test]
async fn test_disconnect_destroys_policy_when_configured() {
    let mut config = AutogradeConfig::default();
    config.players.destroy_on_disconnect = true;
    let (server, _guard) = create_test_server_with(config, None);
    register_stone_builder(&server).await;
    server
        .post("/command")
        .json(&json!({ "actor": 1, "args": ["2"] }))
        .await
        .assert_status_ok();

    let response: DisconnectResponse = server
        .post("/disconnect")
        .json(&json!({ "actor": 1 }))
        .await
        .json();

    assert!(response.destroyed);
    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.stats.policies, 0);
}

// =============================================================================
// COMMANDS
// =============================================================================

#[tokio::test]
async fn test_console_cycles_tiers() {
    let (server, _guard) = create_test_server();
    server
        .post("/actors")
        .json(&json!({ "id": 1, "capabilities": ["bgrade.all"] }))
        .await
        .assert_status_ok();

    let first: CommandResponse = server
        .post("/command")
        .json(&json!({ "actor": 1, "channel": "console" }))
        .await
        .json();
    let second: CommandResponse = server
        .post("/command")
        .json(&json!({ "actor": 1, "channel": "console" }))
        .await
        .json();

    assert!(first.lines[0].contains("grade <color=orange>1</color>"));
    assert!(second.lines[0].contains("grade <color=orange>2</color>"));
}

#[tokio::test]
async fn test_unknown_alias_is_not_found() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/command")
        .json(&json!({ "actor": 1, "alias": "upgrade", "args": ["2"] }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_command_without_capability_gets_permission_reply() {
    let (server, _guard) = create_test_server();

    let reply: CommandResponse = server
        .post("/command")
        .json(&json!({ "actor": 1, "alias": "grade", "args": ["2"] }))
        .await
        .json();

    assert_eq!(
        reply.lines,
        vec!["You don't have permission to use that command".to_string()]
    );
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

#[tokio::test]
async fn test_auth_required_when_key_set() {
    let (server, _guard) = create_test_server_with(AutogradeConfig::default(), Some("s3cret"));

    server.get("/status").await.assert_status(StatusCode::UNAUTHORIZED);
    server
        .get("/status")
        .add_header(header::AUTHORIZATION, bearer("wrong"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .get("/status")
        .add_header(header::AUTHORIZATION, bearer("s3cret"))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_health_is_open_with_key_set() {
    let (server, _guard) = create_test_server_with(AutogradeConfig::default(), Some("s3cret"));

    server.get("/health").await.assert_status_ok();
}
