//! Envelope wire format
//!
//! `{"type": string, "to": string?, "from": string?, "data": any}`

use super::{ControlRequest, MessageType};
use crate::error::{CoreError, CoreResult};
use crate::ice::IceServerList;
use crate::value_objects::ClientId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Routed signaling message
///
/// `data` is opaque: the router never looks inside it for forward-plane traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type tag
    #[serde(rename = "type")]
    pub kind: MessageType,

    /// Destination client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<ClientId>,

    /// Sender, always stamped server-side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ClientId>,

    /// Opaque payload
    #[serde(default)]
    pub data: Value,
}

/// Envelope as sent by a client
///
/// Has no `from` field: whatever the client put there is skipped unread.
#[derive(Deserialize)]
struct InboundEnvelope {
    #[serde(rename = "type")]
    kind: MessageType,
    #[serde(default)]
    to: Option<ClientId>,
    #[serde(default)]
    data: Value,
}

impl From<InboundEnvelope> for Envelope {
    fn from(inbound: InboundEnvelope) -> Self {
        Self {
            kind: inbound.kind,
            to: inbound.to,
            from: None,
            data: inbound.data,
        }
    }
}

impl Envelope {
    /// Create an envelope with no addressing
    #[must_use]
    pub fn new(kind: impl Into<MessageType>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            to: None,
            from: None,
            data,
        }
    }

    /// Set the destination
    #[must_use]
    pub fn with_to(mut self, to: ClientId) -> Self {
        self.to = Some(to);
        self
    }

    /// Set the sender
    #[must_use]
    pub fn with_from(mut self, from: ClientId) -> Self {
        self.from = Some(from);
        self
    }

    /// Reply to an ICE server request
    #[must_use]
    pub fn ice_servers(to: ClientId, servers: &IceServerList) -> Self {
        let data = serde_json::to_value(servers).unwrap_or_default();
        Self::new(MessageType::ICE_SERVERS, data).with_to(to)
    }

    /// Reply describing why a control request was not served
    #[must_use]
    pub fn error(to: ClientId, request: ControlRequest, reason: &str) -> Self {
        Self::new(
            MessageType::ERROR,
            json!({ "reason": reason, "request": request.as_str() }),
        )
        .with_to(to)
    }

    /// Overwrite the sender with the authenticated identity
    pub fn stamp_sender(&mut self, from: &ClientId) {
        self.from = Some(from.clone());
    }

    /// Destination, treating an empty `to` as absent
    #[must_use]
    pub fn target(&self) -> Option<&ClientId> {
        self.to.as_ref().filter(|id| !id.is_empty())
    }

    /// Reason string of an error envelope
    #[must_use]
    pub fn error_reason(&self) -> Option<&str> {
        if self.kind != MessageType::ERROR {
            return None;
        }
        self.data.get("reason").and_then(Value::as_str)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string(self).map_err(CoreError::Encode)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json).map_err(CoreError::Decode)
    }

    /// Deserialize a frame received from a client, ignoring its `from`
    pub fn from_client_json(json: &str) -> CoreResult<Self> {
        serde_json::from_str::<InboundEnvelope>(json)
            .map(Self::from)
            .map_err(CoreError::Decode)
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Envelope(type={}", self.kind)?;
        if let Some(from) = &self.from {
            write!(f, ", from={from}")?;
        }
        if let Some(to) = self.target() {
            write!(f, ", to={to}")?;
        }
        write!(f, ")")
    }
}
