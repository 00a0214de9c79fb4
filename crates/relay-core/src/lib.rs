//! # relay-core
//!
//! Domain layer for the relay engine: client identities, signaling envelopes and
//! ICE server descriptors. This crate has no dependency on any transport.

pub mod envelope;
pub mod error;
pub mod ice;
pub mod protocol;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use envelope::{ControlRequest, Envelope, MessageType};
pub use error::{CoreError, CoreResult};
pub use ice::{IceServer, IceServerList, IceServerProvider, StaticIceServers};
pub use protocol::CloseCode;
pub use value_objects::ClientId;
