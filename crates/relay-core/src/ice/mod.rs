//! ICE server descriptors
//!
//! Short-lived connectivity-assistance entries (STUN/TURN) handed to clients,
//! and the provider port that produces them.

mod ice_server;
mod provider;

pub use ice_server::{IceServer, IceServerList};
pub use provider::{IceServerProvider, StaticIceServers};
