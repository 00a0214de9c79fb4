//! Proxy server setup
//!
//! Provides the proxy routes and listener.

mod handler;
mod state;

pub use handler::ws_handler;
pub use state::ProxyState;

use axum::{routing::get, Json, Router};
use relay_common::{cors_layer, AppConfig, AppError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "relay-proxy".to_string(),
    })
}

/// Create the proxy router
pub fn create_router() -> Router<ProxyState> {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check))
}

/// Build the complete application
pub fn create_app(state: ProxyState) -> Router {
    create_router()
        .layer(cors_layer(&state.config().cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the proxy server until Ctrl+C
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!("Starting WebSocket proxy on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::bind(addr, e))?;

    tracing::info!("Proxy listening on ws://{}/ws", addr);

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

/// Run the complete proxy server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.proxy.socket_addr()?;

    tracing::info!(upstream = %config.upstream.url, "Relaying to upstream");

    let app = create_app(ProxyState::new(config));

    run_server(app, addr).await
}
