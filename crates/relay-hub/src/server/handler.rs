//! WebSocket handler
//!
//! One reader and one writer task per connection. The writer drains the
//! connection's outbound queue; the reader feeds the router. Whichever finishes
//! first ends the connection.

use crate::connection::{ConnectionHandle, Outbound, Registration};
use crate::server::HubState;
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use relay_common::ClientIdentity;
use relay_core::{ClientId, CloseCode};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// How long the writer may take to flush its close frame after the reader ended
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Why the read side of a connection stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadEnd {
    /// Client sent a close frame or the stream ended
    Closed,
    /// No frame within the idle timeout
    Idle,
    /// Transport error
    Failed,
}

impl ReadEnd {
    fn close_code(self) -> CloseCode {
        match self {
            Self::Closed | Self::Failed => CloseCode::Normal,
            Self::Idle => CloseCode::IdleTimeout,
        }
    }
}

/// Signaling WebSocket endpoint
///
/// The identity is resolved before the upgrade, so a request without one is
/// rejected with 400 and never reaches the registry.
pub async fn ws_handler(
    State(state): State<HubState>,
    ClientIdentity(client_id): ClientIdentity,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, client_id, socket))
}

/// Handle an upgraded signaling connection
async fn handle_socket(state: HubState, client_id: ClientId, socket: WebSocket) {
    let connection = &state.config().connection;
    let (handle, outbound) = ConnectionHandle::channel(client_id.clone(), connection.outbound_buffer);
    let idle_timeout = connection.idle_timeout();

    let registration = match state.registry().register(handle).await {
        Ok(registration) => registration,
        Err(e) => {
            tracing::error!(client_id = %client_id, error = %e, "Failed to register connection");
            return;
        }
    };

    tracing::info!(client_id = %client_id, "WebSocket connection established");

    let (ws_sink, ws_stream) = socket.split();

    let mut send_task = tokio::spawn(write_loop(client_id.clone(), ws_sink, outbound));
    let mut recv_task = tokio::spawn(read_loop(
        state.clone(),
        registration.clone(),
        ws_stream,
        idle_timeout,
    ));

    // Wait for either side to finish
    tokio::select! {
        result = &mut recv_task => {
            let end = result.unwrap_or(ReadEnd::Failed);
            tracing::debug!(client_id = %client_id, end = ?end, "Receive task ended");

            // Closing the handle lets the writer flush a close frame and stop
            release(&state, registration, end.close_code()).await;
            if timeout(CLOSE_GRACE, &mut send_task).await.is_err() {
                send_task.abort();
            }
        }
        _ = &mut send_task => {
            tracing::debug!(client_id = %client_id, "Send task ended");
            recv_task.abort();
            release(&state, registration, CloseCode::Normal).await;
        }
    }

    tracing::info!(client_id = %client_id, "WebSocket connection closed");
}

async fn release(state: &HubState, registration: Registration, code: CloseCode) {
    if let Err(e) = state.registry().release(registration, code).await {
        tracing::warn!(error = %e, "Failed to release registration");
    }
}

/// Drain the outbound queue into the socket
async fn write_loop(
    client_id: ClientId,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Outbound>,
) {
    while let Some(frame) = outbound.recv().await {
        match frame {
            Outbound::Text(text) => {
                if ws_sink.send(Message::Text(text.into())).await.is_err() {
                    tracing::warn!(client_id = %client_id, "Failed to send message to WebSocket");
                    break;
                }
            }
            Outbound::Close(code) => {
                tracing::debug!(client_id = %client_id, close_code = %code, "Closing connection");
                let frame = CloseFrame {
                    code: code.as_u16(),
                    reason: code.description().into(),
                };
                let _ = ws_sink.send(Message::Close(Some(frame))).await;
                break;
            }
        }
    }

    // Close the WebSocket when the handle is dropped
    let _ = ws_sink.close().await;
}

/// Feed inbound frames to the router until the client goes away
async fn read_loop(
    state: HubState,
    registration: Registration,
    mut ws_stream: SplitStream<WebSocket>,
    idle_timeout: Duration,
) -> ReadEnd {
    let client_id = registration.client_id();
    loop {
        let Ok(next) = timeout(idle_timeout, ws_stream.next()).await else {
            tracing::info!(
                client_id = %client_id,
                idle_secs = idle_timeout.as_secs(),
                "Connection idle, closing"
            );
            return ReadEnd::Idle;
        };

        match next {
            Some(Ok(Message::Text(text))) => {
                let outcome = state.router().route_text(&registration, &text).await;
                tracing::trace!(client_id = %client_id, outcome = ?outcome, "Envelope routed");
            }
            Some(Ok(Message::Binary(_))) => {
                tracing::debug!(client_id = %client_id, "Binary frame dropped");
            }
            Some(Ok(Message::Ping(_))) => {
                tracing::trace!(client_id = %client_id, "Ping received");
                // Pong is handled automatically by axum
            }
            Some(Ok(Message::Pong(_))) => {
                tracing::trace!(client_id = %client_id, "Pong received");
            }
            Some(Ok(Message::Close(_))) | None => {
                tracing::debug!(client_id = %client_id, "Client closed connection");
                return ReadEnd::Closed;
            }
            Some(Err(e)) => {
                tracing::debug!(client_id = %client_id, error = %e, "WebSocket read error");
                return ReadEnd::Failed;
            }
        }
    }
}
