//! WebSocket proxy entry point
//!
//! Run with:
//! ```bash
//! cargo run -p relay-proxy
//! ```
//!
//! Configuration is loaded from environment variables.

use anyhow::Context;
use relay_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Proxy failed");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    // Initialize tracing
    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        address = %config.proxy.address(),
        upstream = %config.upstream.url,
        debug_payloads = config.upstream.debug_payloads,
        "Configuration loaded"
    );

    // Run the proxy server
    relay_proxy::run(config).await?;

    Ok(())
}
