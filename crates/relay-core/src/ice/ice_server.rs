use serde::{Deserialize, Serialize};

/// A single STUN/TURN entry in `RTCIceServer` shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    /// Server URL, e.g. `stun:stun.l.google.com:19302`
    pub urls: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServer {
    /// STUN entry without credentials
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: url.into(),
            username: None,
            credential: None,
        }
    }

    /// TURN entry with a credential pair
    pub fn turn(
        url: impl Into<String>,
        username: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            urls: url.into(),
            username: Some(username.into()),
            credential: Some(credential.into()),
        }
    }

    /// Check if this entry carries credentials
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.credential.is_some()
    }
}

/// `{"iceServers": [...]}` body shared by the HTTP endpoint and the control reply
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IceServerList {
    #[serde(rename = "iceServers")]
    pub ice_servers: Vec<IceServer>,
}

impl IceServerList {
    #[must_use]
    pub fn new(ice_servers: Vec<IceServer>) -> Self {
        Self { ice_servers }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ice_servers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ice_servers.is_empty()
    }
}
