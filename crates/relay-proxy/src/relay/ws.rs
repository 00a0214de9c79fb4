//! Socket adapters
//!
//! Turn axum (client side) and tungstenite (upstream side) socket halves into
//! the `RelayFrame` streams and sinks the relay works with. Ping and pong
//! frames are dropped here; each hop answers its own pings.

use super::{RelayError, RelayFrame};
use axum::extract::ws::{Message as AxumMessage, WebSocket};
use futures::{
    future,
    stream::{SplitSink, SplitStream},
    Sink, SinkExt, Stream, StreamExt,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    tungstenite::{error::ProtocolError, Error as WsError, Message as WsMessage},
    MaybeTlsStream, WebSocketStream,
};

/// Upstream connection as returned by `connect_async`
pub type UpstreamSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

impl From<RelayFrame> for AxumMessage {
    fn from(frame: RelayFrame) -> Self {
        match frame {
            RelayFrame::Text(text) => Self::Text(text),
            RelayFrame::Binary(bytes) => Self::Binary(bytes),
        }
    }
}

impl From<RelayFrame> for WsMessage {
    fn from(frame: RelayFrame) -> Self {
        match frame {
            RelayFrame::Text(text) => Self::Text(text),
            RelayFrame::Binary(bytes) => Self::Binary(bytes),
        }
    }
}

fn from_axum(message: AxumMessage) -> Option<Result<RelayFrame, RelayError>> {
    match message {
        AxumMessage::Text(text) => Some(Ok(RelayFrame::Text(text))),
        AxumMessage::Binary(bytes) => Some(Ok(RelayFrame::Binary(bytes))),
        AxumMessage::Ping(_) | AxumMessage::Pong(_) => None,
        AxumMessage::Close(frame) => Some(Err(RelayError::closed(frame.map(|f| f.code)))),
    }
}

fn from_tungstenite(message: WsMessage) -> Option<Result<RelayFrame, RelayError>> {
    match message {
        WsMessage::Text(text) => Some(Ok(RelayFrame::Text(text))),
        WsMessage::Binary(bytes) => Some(Ok(RelayFrame::Binary(bytes))),
        WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => None,
        WsMessage::Close(frame) => Some(Err(RelayError::closed(
            frame.map(|f| u16::from(f.code)),
        ))),
    }
}

fn axum_error(err: axum::Error) -> RelayError {
    RelayError::from_transport(&err)
}

/// Classify a tungstenite error
pub fn tungstenite_error(err: WsError) -> RelayError {
    match err {
        WsError::ConnectionClosed | WsError::AlreadyClosed => RelayError::closed(None),
        WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => {
            RelayError::closed(Some(1006))
        }
        other => RelayError::from_transport(&other),
    }
}

/// Frames read from the client
pub fn client_stream(
    stream: SplitStream<WebSocket>,
) -> impl Stream<Item = Result<RelayFrame, RelayError>> + Unpin + Send + 'static {
    stream.filter_map(|item| {
        future::ready(match item {
            Ok(message) => from_axum(message),
            Err(e) => Some(Err(axum_error(e))),
        })
    })
}

/// Frames written to the client
pub fn client_sink(
    sink: SplitSink<WebSocket, AxumMessage>,
) -> impl Sink<RelayFrame, Error = RelayError> + Unpin + Send + 'static {
    sink.sink_map_err(axum_error)
        .with(|frame: RelayFrame| future::ready(Ok::<_, RelayError>(AxumMessage::from(frame))))
}

/// Frames read from the upstream
pub fn upstream_stream(
    stream: SplitStream<UpstreamSocket>,
) -> impl Stream<Item = Result<RelayFrame, RelayError>> + Unpin + Send + 'static {
    stream.filter_map(|item| {
        future::ready(match item {
            Ok(message) => from_tungstenite(message),
            Err(e) => Some(Err(tungstenite_error(e))),
        })
    })
}

/// Frames written to the upstream
pub fn upstream_sink(
    sink: SplitSink<UpstreamSocket, WsMessage>,
) -> impl Sink<RelayFrame, Error = RelayError> + Unpin + Send + 'static {
    sink.sink_map_err(tungstenite_error)
        .with(|frame: RelayFrame| future::ready(Ok::<_, RelayError>(WsMessage::from(frame))))
}
