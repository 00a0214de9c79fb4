//! Hub state
//!
//! Application state shared by every route of the signaling hub.

use crate::connection::Registry;
use crate::ratelimit::CooldownLimiter;
use crate::router::MessageRouter;
use relay_common::AppConfig;
use relay_core::StaticIceServers;
use std::sync::Arc;

/// Hub application state
#[derive(Clone)]
pub struct HubState {
    /// Registry actor front end
    registry: Registry,
    /// Envelope router used by every connection
    router: Arc<MessageRouter>,
    /// ICE descriptors served over HTTP and through the control plane
    ice_servers: Arc<StaticIceServers>,
    /// Client for the TURN credential upstream
    http_client: reqwest::Client,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl HubState {
    /// Wire the registry, limiter and ICE provider into a router
    pub fn new(
        registry: Registry,
        limiter: Arc<CooldownLimiter>,
        ice_servers: Arc<StaticIceServers>,
        http_client: reqwest::Client,
        config: AppConfig,
    ) -> Self {
        let router = MessageRouter::new(registry.clone(), limiter, ice_servers.clone());
        Self {
            registry,
            router: Arc::new(router),
            ice_servers,
            http_client,
            config: Arc::new(config),
        }
    }

    /// Get the connection registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Get the message router
    pub fn router(&self) -> &Arc<MessageRouter> {
        &self.router
    }

    /// Get the configured ICE servers
    pub fn ice_servers(&self) -> &StaticIceServers {
        &self.ice_servers
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for HubState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubState")
            .field("registry", &self.registry)
            .field("ice_servers", &self.ice_servers.list().len())
            .field("config", &"AppConfig")
            .finish()
    }
}
