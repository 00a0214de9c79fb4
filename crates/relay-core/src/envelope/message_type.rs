//! Envelope message types
//!
//! The `type` tag is an open set. A small reserved subset is handled by the
//! server itself (control plane); everything else is forwarded untouched.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Envelope `type` tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageType(String);

/// Control-plane requests the server answers itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlRequest {
    /// Request for the STUN/TURN server list (rate limited per client)
    IceServers,
}

impl MessageType {
    /// Client asks for ICE server descriptors
    pub const ICE_SERVERS_REQUEST: &'static str = "ice-servers-request";
    /// Server reply carrying ICE server descriptors
    pub const ICE_SERVERS: &'static str = "ice-servers";
    /// Server reply describing a refused or failed control request
    pub const ERROR: &'static str = "error";

    // Common forward-plane tags used by browser peers
    pub const OFFER: &'static str = "offer";
    pub const ANSWER: &'static str = "answer";
    pub const CANDIDATE: &'static str = "candidate";
    pub const CALL_REQUEST: &'static str = "call-request";
    pub const CALL_ACCEPT: &'static str = "call-accept";
    pub const CALL_REJECT: &'static str = "call-reject";
    pub const HANGUP: &'static str = "hangup";

    /// Create a message type from any tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Get the raw tag
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classify this tag as a control-plane request, if it is one
    #[must_use]
    pub fn control(&self) -> Option<ControlRequest> {
        match self.0.as_str() {
            Self::ICE_SERVERS_REQUEST => Some(ControlRequest::IceServers),
            _ => None,
        }
    }

    /// Check if this tag is handled by the server rather than forwarded
    #[must_use]
    pub fn is_control(&self) -> bool {
        self.control().is_some()
    }
}

impl ControlRequest {
    /// Get the wire tag of this request
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IceServers => MessageType::ICE_SERVERS_REQUEST,
        }
    }
}

impl From<&str> for MessageType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for MessageType {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

impl PartialEq<&str> for MessageType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
