//! Hub server setup
//!
//! Routes, state wiring and the listener for the signaling hub.

mod handler;
mod routes;
mod state;

pub use handler::ws_handler;
pub use routes::{health_check, ice_servers, turn_credentials, HealthResponse};
pub use state::HubState;

use crate::connection::Registry;
use crate::ratelimit::CooldownLimiter;
use axum::{routing::get, Router};
use relay_common::{cors_layer, AppConfig, AppError, IceConfig};
use relay_core::{IceServer, StaticIceServers};
use std::net::SocketAddr;
use std::sync::{Arc, Weak};
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Create the hub router
pub fn create_router(config: &AppConfig) -> Router<HubState> {
    let router = Router::new()
        .route("/ws", get(ws_handler))
        .route("/ice-servers", get(ice_servers))
        .route("/turn-credentials", get(turn_credentials))
        .route("/health", get(health_check));

    match &config.static_files.dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}

/// Build the complete application
pub fn create_app(state: HubState) -> Router {
    create_router(state.config())
        .layer(cors_layer(&state.config().cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the ICE server list handed out by the hub
pub fn ice_servers_from_config(config: &IceConfig) -> StaticIceServers {
    let mut servers: Vec<IceServer> = config.stun_urls.iter().map(IceServer::stun).collect();
    if let Some(turn) = &config.turn {
        servers.push(IceServer::turn(
            turn.url.clone(),
            turn.username.clone(),
            turn.credential.clone(),
        ));
    }
    StaticIceServers::new(servers)
}

/// Initialize all dependencies and create `HubState`
///
/// Must be called inside a Tokio runtime: the registry actor and the limiter
/// sweeper are spawned here.
pub fn create_hub_state(config: AppConfig) -> Result<HubState, AppError> {
    let registry = Registry::spawn();

    let limiter = Arc::new(CooldownLimiter::new(config.rate_limit.ice_cooldown()));
    spawn_limiter_sweeper(Arc::downgrade(&limiter));

    let ice_servers = Arc::new(ice_servers_from_config(&config.ice));
    tracing::info!(count = ice_servers.list().len(), "ICE servers configured");

    let http_client = reqwest::Client::builder()
        .timeout(config.credentials.timeout())
        .build()
        .map_err(AppError::internal)?;

    Ok(HubState::new(
        registry,
        limiter,
        ice_servers,
        http_client,
        config,
    ))
}

/// Periodically drop limiter entries whose window has elapsed
fn spawn_limiter_sweeper(limiter: Weak<CooldownLimiter>) {
    tokio::spawn(async move {
        let period = match limiter.upgrade() {
            Some(limiter) => limiter.window().max(std::time::Duration::from_secs(1)),
            None => return,
        };
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let Some(limiter) = limiter.upgrade() else {
                break;
            };
            let removed = limiter.sweep(Instant::now());
            if removed > 0 {
                tracing::debug!(removed, tracked = limiter.len(), "Rate limiter swept");
            }
        }
    });
}

/// Run the hub server until Ctrl+C
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!("Starting signaling hub on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::bind(addr, e))?;

    tracing::info!("Hub listening on ws://{}/ws", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Server(e.to_string()))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Run the complete hub server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.hub.socket_addr()?;

    // Create hub state
    let state = create_hub_state(config)?;

    // Build application
    let app = create_app(state);

    // Run server
    run_server(app, addr).await
}
