//! Connection management
//!
//! Outbound handles for live WebSocket connections and the registry actor that
//! maps client ids to them.

mod handle;
mod registry;

pub use handle::{ConnectionHandle, Outbound, SendError};
pub use registry::{Registration, Registry, DEFAULT_COMMAND_BUFFER};
