//! Connection handle
//!
//! The write side of one WebSocket connection, as seen by the rest of the hub.
//! Frames are queued onto the connection's writer task; nothing here touches the
//! socket.

use relay_core::{ClientId, CloseCode};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Frame queued for a connection's writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Serialized envelope
    Text(String),
    /// Send a close frame and stop writing
    Close(CloseCode),
}

/// Errors delivering to a registered client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("Client {0} is not connected")]
    NotConnected(ClientId),

    #[error("Outbound queue for {0} is full")]
    Backpressure(ClientId),

    #[error("Connection for {0} is closed")]
    Closed(ClientId),

    #[error("Registry has stopped")]
    RegistryStopped,
}

/// Outbound side of a registered connection
///
/// Not `Clone`: the registry holds the only handle, and `close` consumes it, so a
/// connection can be closed at most once.
#[derive(Debug)]
pub struct ConnectionHandle {
    client_id: ClientId,
    tx: mpsc::Sender<Outbound>,
}

impl ConnectionHandle {
    pub fn new(client_id: ClientId, tx: mpsc::Sender<Outbound>) -> Self {
        Self { client_id, tx }
    }

    /// Create a handle together with the receiver its writer task drains
    pub fn channel(client_id: ClientId, buffer: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(client_id, tx), rx)
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Queue a text frame without waiting
    pub fn send(&self, payload: String) -> Result<(), SendError> {
        self.tx
            .try_send(Outbound::Text(payload))
            .map_err(|e| match e {
                TrySendError::Full(_) => SendError::Backpressure(self.client_id.clone()),
                TrySendError::Closed(_) => SendError::Closed(self.client_id.clone()),
            })
    }

    /// Ask the writer to send a close frame, then drop the sender
    ///
    /// If the queue is full the close frame is skipped; dropping the sender still
    /// ends the writer once it drains.
    pub fn close(self, code: CloseCode) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(Outbound::Close(code)) {
            tracing::debug!(
                client_id = %self.client_id,
                close_code = code.as_u16(),
                "Outbound queue full, closing without close frame"
            );
        }
    }
}
