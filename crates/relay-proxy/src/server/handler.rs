//! WebSocket handler
//!
//! Upgrades the client, dials the upstream on its behalf and relays until
//! either side goes away.

use crate::relay::{ws, DuplexRelay};
use crate::server::ProxyState;
use crate::upstream;
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::StreamExt;
use relay_common::ClientIdentity;
use relay_core::{ClientId, CloseCode};

/// Proxy WebSocket endpoint
pub async fn ws_handler(
    State(state): State<ProxyState>,
    ClientIdentity(client_id): ClientIdentity,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, client_id, socket))
}

/// Handle an upgraded client connection
async fn handle_socket(state: ProxyState, client_id: ClientId, mut socket: WebSocket) {
    let upstream_config = &state.config().upstream;

    let upstream = match upstream::connect(upstream_config, &client_id).await {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::warn!(
                client_id = %client_id,
                url = %upstream_config.url,
                error = %e,
                "Failed to connect to upstream"
            );
            let code = CloseCode::UpstreamUnavailable;
            let frame = CloseFrame {
                code: code.as_u16(),
                reason: code.description().into(),
            };
            let _ = socket.send(Message::Close(Some(frame))).await;
            return;
        }
    };

    let relay = DuplexRelay::new(client_id.clone()).with_debug_payloads(upstream_config.debug_payloads);
    let relay_id = relay.id();

    tracing::info!(client_id = %client_id, relay_id = %relay_id, "Relay established");

    let (client_sink, client_stream) = socket.split();
    let (upstream_sink, upstream_stream) = upstream.split();

    let outcome = relay
        .run(
            (ws::client_sink(client_sink), ws::client_stream(client_stream)),
            (
                ws::upstream_sink(upstream_sink),
                ws::upstream_stream(upstream_stream),
            ),
        )
        .await;

    tracing::info!(
        client_id = %client_id,
        relay_id = %relay_id,
        ended_by = %outcome.ended_by,
        to_upstream = outcome.client_to_upstream.frames,
        to_client = outcome.upstream_to_client.frames,
        "Relay closed"
    );
}
