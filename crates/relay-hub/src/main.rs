//! Signaling hub entry point
//!
//! Run with:
//! ```bash
//! cargo run -p relay-hub
//! ```
//!
//! Configuration is loaded from environment variables.

use anyhow::Context;
use relay_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Hub failed");
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
        address = %config.hub.address(),
        ice_cooldown_secs = config.rate_limit.ice_cooldown_secs,
        "Configuration loaded"
    );

    // Run the hub server
    relay_hub::run(config).await?;

    Ok(())
}
