//! Signaling envelope
//!
//! The unit of routed signaling traffic and its message-type tags.

mod envelope;
mod message_type;

pub use envelope::Envelope;
pub use message_type::{ControlRequest, MessageType};
