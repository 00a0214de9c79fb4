//! Duplex relay
//!
//! Two forwarding tasks, one per direction, share a single-fire cancellation
//! token. The first direction to stop cancels the token, which ends the other.
//! Once both are done, each sink is closed exactly once.

use super::{RelayError, RelayFrame};
use futures::{Sink, SinkExt, Stream, StreamExt};
use relay_core::ClientId;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Upper bound on flushing a close to either side
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Forwarding direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToUpstream,
    UpstreamToClient,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientToUpstream => "client->upstream",
            Self::UpstreamToClient => "upstream->client",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one direction stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectionEnd {
    /// The other direction stopped first
    Cancelled,
    /// Reading from the source ended
    Source(RelayError),
    /// Writing to the sink failed
    Sink(RelayError),
    /// The forwarding task panicked
    Aborted,
}

impl DirectionEnd {
    /// Whether this end is worth a warning
    pub fn is_failure(&self) -> bool {
        match self {
            Self::Cancelled => false,
            Self::Source(e) | Self::Sink(e) => !e.is_normal(),
            Self::Aborted => true,
        }
    }
}

/// Per-direction summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionReport {
    pub frames: u64,
    pub end: DirectionEnd,
}

/// Result of a finished relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub relay_id: Uuid,
    /// Direction that stopped first and ended the relay
    pub ended_by: Direction,
    pub client_to_upstream: DirectionReport,
    pub upstream_to_client: DirectionReport,
}

/// Relay between one client connection and its upstream connection
#[derive(Debug, Clone)]
pub struct DuplexRelay {
    id: Uuid,
    client_id: ClientId,
    debug_payloads: bool,
}

/// Shared between the two forwarding tasks of one relay
struct Shared {
    relay_id: Uuid,
    client_id: ClientId,
    debug_payloads: bool,
    token: CancellationToken,
    first_end: OnceLock<Direction>,
}

impl DuplexRelay {
    pub fn new(client_id: ClientId) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            debug_payloads: false,
        }
    }

    /// Trace-log every forwarded payload
    #[must_use]
    pub fn with_debug_payloads(mut self, enabled: bool) -> Self {
        self.debug_payloads = enabled;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Forward in both directions until either side stops
    ///
    /// `client` and `upstream` are `(sink, stream)` pairs as returned by
    /// `StreamExt::split`.
    pub async fn run<CSi, CSt, USi, USt>(
        self,
        client: (CSi, CSt),
        upstream: (USi, USt),
    ) -> RelayOutcome
    where
        CSi: Sink<RelayFrame, Error = RelayError> + Unpin + Send + 'static,
        CSt: Stream<Item = Result<RelayFrame, RelayError>> + Unpin + Send + 'static,
        USi: Sink<RelayFrame, Error = RelayError> + Unpin + Send + 'static,
        USt: Stream<Item = Result<RelayFrame, RelayError>> + Unpin + Send + 'static,
    {
        let (client_sink, client_stream) = client;
        let (upstream_sink, upstream_stream) = upstream;

        let shared = Arc::new(Shared {
            relay_id: self.id,
            client_id: self.client_id,
            debug_payloads: self.debug_payloads,
            token: CancellationToken::new(),
            first_end: OnceLock::new(),
        });

        tracing::debug!(relay_id = %shared.relay_id, client_id = %shared.client_id, "Relay started");

        let to_upstream = tokio::spawn(forward(
            Direction::ClientToUpstream,
            client_stream,
            upstream_sink,
            shared.clone(),
        ));
        let to_client = tokio::spawn(forward(
            Direction::UpstreamToClient,
            upstream_stream,
            client_sink,
            shared.clone(),
        ));

        let (to_upstream, to_client) = tokio::join!(to_upstream, to_client);

        let client_to_upstream = finish(to_upstream, &shared).await;
        let upstream_to_client = finish(to_client, &shared).await;

        // Unset only when a task panicked before recording itself
        let ended_by = shared.first_end.get().copied().unwrap_or(
            if upstream_to_client.end == DirectionEnd::Aborted {
                Direction::UpstreamToClient
            } else {
                Direction::ClientToUpstream
            },
        );

        tracing::debug!(
            relay_id = %shared.relay_id,
            client_id = %shared.client_id,
            ended_by = %ended_by,
            "Relay finished"
        );

        RelayOutcome {
            relay_id: shared.relay_id,
            ended_by,
            client_to_upstream,
            upstream_to_client,
        }
    }
}

/// Close the sink a forwarding task handed back
async fn finish<Si>(
    joined: Result<(Si, DirectionReport), tokio::task::JoinError>,
    shared: &Shared,
) -> DirectionReport
where
    Si: Sink<RelayFrame, Error = RelayError> + Unpin,
{
    match joined {
        Ok((mut sink, report)) => {
            match tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::trace!(relay_id = %shared.relay_id, error = %e, "Close after relay end");
                }
                Err(_) => {
                    tracing::debug!(relay_id = %shared.relay_id, "Timed out closing connection");
                }
            }
            report
        }
        Err(e) => {
            tracing::error!(
                relay_id = %shared.relay_id,
                client_id = %shared.client_id,
                error = %e,
                "Forwarding task failed"
            );
            DirectionReport {
                frames: 0,
                end: DirectionEnd::Aborted,
            }
        }
    }
}

/// Copy frames from `source` to `sink` until either stops or the relay is cancelled
///
/// Returns the sink so the relay can close it once both directions are done.
async fn forward<St, Si>(
    direction: Direction,
    mut source: St,
    mut sink: Si,
    shared: Arc<Shared>,
) -> (Si, DirectionReport)
where
    St: Stream<Item = Result<RelayFrame, RelayError>> + Unpin,
    Si: Sink<RelayFrame, Error = RelayError> + Unpin,
{
    // Fires on every exit, unwinding included
    let _cancel_on_exit = shared.token.clone().drop_guard();
    let mut frames: u64 = 0;

    let end = loop {
        let next = tokio::select! {
            () = shared.token.cancelled() => break DirectionEnd::Cancelled,
            next = source.next() => next,
        };

        let frame = match next {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => break DirectionEnd::Source(e),
            None => break DirectionEnd::Source(RelayError::closed(None)),
        };

        if shared.debug_payloads {
            match &frame {
                RelayFrame::Text(text) => tracing::trace!(
                    relay_id = %shared.relay_id,
                    direction = %direction,
                    payload = %text,
                    "Forwarding text frame"
                ),
                RelayFrame::Binary(bytes) => tracing::trace!(
                    relay_id = %shared.relay_id,
                    direction = %direction,
                    len = bytes.len(),
                    "Forwarding binary frame"
                ),
            }
        }

        let sent = tokio::select! {
            () = shared.token.cancelled() => break DirectionEnd::Cancelled,
            sent = sink.send(frame) => sent,
        };
        if let Err(e) = sent {
            break DirectionEnd::Sink(e);
        }
        frames += 1;
    };

    if end != DirectionEnd::Cancelled {
        let _ = shared.first_end.set(direction);
    }

    if end.is_failure() {
        tracing::warn!(
            relay_id = %shared.relay_id,
            client_id = %shared.client_id,
            direction = %direction,
            end = ?end,
            frames,
            "Relay direction failed"
        );
    } else {
        tracing::debug!(
            relay_id = %shared.relay_id,
            client_id = %shared.client_id,
            direction = %direction,
            end = ?end,
            frames,
            "Relay direction ended"
        );
    }

    (sink, DirectionReport { frames, end })
}
