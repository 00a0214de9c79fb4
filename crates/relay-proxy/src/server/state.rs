//! Proxy state

use relay_common::AppConfig;
use std::sync::Arc;

/// Proxy application state
#[derive(Debug, Clone)]
pub struct ProxyState {
    config: Arc<AppConfig>,
}

impl ProxyState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
