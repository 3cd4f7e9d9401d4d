//! # Autograde HTTP Event Bridge
//!
//! Feeds host events into a running [`Runtime`] over HTTP.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Service counters and clock
//! - `POST /actors` - Register an actor's capabilities and items
//! - `POST /placement` - A piece was placed
//! - `POST /damage` - A structure was hit
//! - `POST /disconnect` - An actor left
//! - `POST /command` - Run a chat or console command
//! - `POST /tick` - Advance the clock, fire due timers, run maintenance
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `AUTOGRADE_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `AUTOGRADE_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `AUTOGRADE_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{API_KEY_ENV, get_api_key_from_env};
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    ActorRequest, ActorResponse, Channel, CommandRequest, CommandResponse, DamageRequest,
    DamageResponse, DisconnectRequest, DisconnectResponse, ErrorResponse, HealthResponse,
    PlacementRequest, StatusResponse, TickRequest, TickResponse,
};

use crate::error::AppError;
use crate::lang::Lang;
use crate::runtime::Runtime;
use autograde_core::{AutogradeConfig, Timestamp};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, RwLockWriteGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Monotonic service clock in whole seconds.
///
/// Starts at zero when the server starts. `advance` skips ahead, which lets
/// a driver fast-forward timers without waiting.
#[derive(Debug)]
pub struct Clock {
    started: Instant,
    offset: AtomicU64,
}

impl Clock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            offset: AtomicU64::new(0),
        }
    }

    /// Current time.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        let elapsed = self.started.elapsed().as_secs();
        Timestamp(elapsed.saturating_add(self.offset.load(Ordering::Acquire)))
    }

    /// Skip ahead and return the new time.
    pub fn advance(&self, seconds: u64) -> Timestamp {
        self.offset.fetch_add(seconds, Ordering::AcqRel);
        self.now()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<RwLock<Runtime>>,
    pub clock: Arc<Clock>,
}

impl AppState {
    /// Create new app state around a started runtime.
    #[must_use]
    pub fn new(runtime: Runtime) -> Self {
        Self {
            runtime: Arc::new(RwLock::new(runtime)),
            clock: Arc::new(Clock::new()),
        }
    }

    /// Take the runtime write lock, then read the clock.
    ///
    /// Event time is sampled under the lock, so every caller sees a time no
    /// earlier than the one the previous lock holder used.
    pub async fn lock_at(&self) -> (RwLockWriteGuard<'_, Runtime>, Timestamp) {
        let runtime = self.runtime.write().await;
        let now = self.clock.now();
        (runtime, now)
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from `AUTOGRADE_CORS_ORIGINS`.
///
/// - `"*"`: allows all origins
/// - unset: localhost only
/// - otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("AUTOGRADE_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (AUTOGRADE_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in AUTOGRADE_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => build_localhost_cors(),
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. CORS
/// 3. Rate limiting (if enabled)
/// 4. Authentication (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED. Set {} to require a key.",
            API_KEY_ENV
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/actors", post(handlers::actor_handler))
        .route("/placement", post(handlers::placement_handler))
        .route("/damage", post(handlers::damage_handler))
        .route("/disconnect", post(handlers::disconnect_handler))
        .route("/command", post(handlers::command_handler))
        .route("/tick", post(handlers::tick_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// BACKGROUND DRIVER
// =============================================================================

/// Fire due timers every second and run maintenance every
/// `maintenance_interval` seconds.
async fn drive(state: AppState, maintenance_interval: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_maintenance = state.clock.now();

    loop {
        ticker.tick().await;
        let (mut runtime, now) = state.lock_at().await;

        let expired = runtime.fire_timers(now);
        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "policy timers fired");
        }

        if maintenance_interval > 0
            && now.0.saturating_sub(last_maintenance.0) >= maintenance_interval
        {
            let pruned = runtime.maintenance(now);
            tracing::debug!(pruned, "maintenance tick");
            last_maintenance = now;
        }

        for entry in runtime.drain_outbox() {
            tracing::info!(?entry, "outbox");
        }
    }
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and its timer driver. Returns after Ctrl-C.
pub async fn run_server(
    addr: &str,
    config: AutogradeConfig,
    lang: Arc<Lang>,
    maintenance_interval: u64,
) -> Result<(), AppError> {
    let state = AppState::new(Runtime::new(config, lang)?);
    let router = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Server(format!("Bind failed: {}", e)))?;

    tracing::info!("Autograde HTTP bridge listening on {}", addr);

    let driver = tokio::spawn(drive(state.clone(), maintenance_interval));

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
        .map_err(|e| AppError::Server(format!("Server error: {}", e)));

    driver.abort();
    state.runtime.write().await.shutdown();
    tracing::info!("Autograde stopped");
    served
}
