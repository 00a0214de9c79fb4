//! WebSocket close codes
//!
//! Close codes sent by the hub and the proxy, plus classification of codes
//! received from peers.

use serde::{Deserialize, Serialize};

/// Close codes used when the server ends a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum CloseCode {
    /// Connection finished normally
    Normal = 1000,
    /// Server is shutting down
    GoingAway = 1001,
    /// Upstream could not be reached (proxy)
    UpstreamUnavailable = 1011,
    /// A newer connection registered the same client id
    Superseded = 4001,
    /// No traffic within the idle timeout
    IdleTimeout = 4002,
    /// Client was removed from the registry
    Unregistered = 4003,
}

impl CloseCode {
    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Get the close reason sent with this code
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Normal => "Normal closure",
            Self::GoingAway => "Server going away",
            Self::UpstreamUnavailable => "Backend connection failed",
            Self::Superseded => "Superseded by a newer connection",
            Self::IdleTimeout => "Idle timeout",
            Self::Unregistered => "Unregistered",
        }
    }

    /// Check if a peer's close code denotes an ordinary hang-up
    ///
    /// 1000 normal, 1001 going away, 1005 no status, 1006 abnormal (dropped TCP).
    #[must_use]
    pub const fn is_expected_peer_close(raw: u16) -> bool {
        matches!(raw, 1000 | 1001 | 1005 | 1006)
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?} ({}): {}", self.as_u16(), self.description())
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}
