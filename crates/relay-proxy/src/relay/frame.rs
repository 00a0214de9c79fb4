//! Relay frames and errors

use relay_core::CloseCode;
use std::error::Error as StdError;
use std::io;
use thiserror::Error;

/// Data message carried across the relay
///
/// Control frames (ping, pong, close) never become `RelayFrame`s: ping and pong
/// are answered on each hop and a close ends the direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayFrame {
    Text(String),
    Binary(Vec<u8>),
}

/// Why one side of the relay stopped producing or accepting frames
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The peer closed, with the close code if one was sent
    #[error("Connection closed (code {code:?})")]
    Closed { code: Option<u16> },

    /// Anything else the transport reported
    #[error("Transport error: {0}")]
    Transport(String),
}

/// 1006: closed without a close frame
const ABNORMAL_CLOSURE: u16 = 1006;

impl RelayError {
    pub fn closed(code: Option<u16>) -> Self {
        Self::Closed { code }
    }

    /// Whether this is an ordinary hang-up rather than a failure
    pub fn is_normal(&self) -> bool {
        match self {
            Self::Closed { code: None } => true,
            Self::Closed { code: Some(code) } => CloseCode::is_expected_peer_close(*code),
            Self::Transport(_) => false,
        }
    }

    /// Classify an opaque transport error
    ///
    /// A dropped TCP connection counts as an abnormal close, not a failure.
    pub fn from_transport(err: &(dyn StdError + 'static)) -> Self {
        if is_connection_drop(err) {
            Self::closed(Some(ABNORMAL_CLOSURE))
        } else {
            Self::Transport(err.to_string())
        }
    }
}

fn is_connection_drop(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        // axum wraps its own tungstenite version, so match on the message
        if e.to_string().contains("without closing handshake") {
            return true;
        }
        current = e.source();
    }
    false
}
