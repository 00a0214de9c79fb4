//! ICE server provider port
//!
//! Issuing descriptors is delegated to an external collaborator; the router only
//! knows this trait.

use super::{IceServer, IceServerList};
use crate::error::CoreResult;
use crate::value_objects::ClientId;
use async_trait::async_trait;

/// Produces ICE server descriptors for a requesting client
#[async_trait]
pub trait IceServerProvider: Send + Sync {
    /// Issue descriptors for `client`
    async fn ice_servers(&self, client: &ClientId) -> CoreResult<IceServerList>;
}

/// Provider returning a fixed, configured list
#[derive(Debug, Clone, Default)]
pub struct StaticIceServers {
    servers: IceServerList,
}

impl StaticIceServers {
    pub fn new(servers: Vec<IceServer>) -> Self {
        Self {
            servers: IceServerList::new(servers),
        }
    }

    /// Public Google STUN server only
    pub fn public_stun() -> Self {
        Self::new(vec![IceServer::stun("stun:stun.l.google.com:19302")])
    }

    pub fn list(&self) -> &IceServerList {
        &self.servers
    }
}

#[async_trait]
impl IceServerProvider for StaticIceServers {
    async fn ice_servers(&self, _client: &ClientId) -> CoreResult<IceServerList> {
        Ok(self.servers.clone())
    }
}
