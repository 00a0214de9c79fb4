//! Message router
//!
//! Every inbound envelope has its sender overwritten with the connection's own
//! identity. Control requests are answered here; everything else is forwarded to
//! the envelope's target, or dropped if it has none.
//!
//! Control replies are addressed to the requesting registration, not just its
//! client id, so a reply racing a reconnect is dropped rather than delivered to
//! the newer connection.

use crate::connection::{Registration, Registry, SendError};
use crate::ratelimit::RateLimiter;
use relay_core::{ClientId, ControlRequest, Envelope, IceServerProvider};
use std::sync::Arc;

/// Reason sent back when a control request is refused by the limiter
pub const REASON_RATE_LIMITED: &str = "rate limited";
/// Reason sent back when the ICE server provider fails
pub const REASON_ICE_UNAVAILABLE: &str = "ice servers unavailable";

/// What happened to one inbound envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Queued for the target client
    Forwarded { to: ClientId },
    /// Forward-plane envelope without a target
    NoTarget,
    /// Target could not be written to
    Undeliverable(SendError),
    /// Text was not a valid envelope
    Malformed,
    /// Control request answered with its reply
    ControlReplied(ControlRequest),
    /// Control request refused by the rate limiter
    RateLimited(ControlRequest),
    /// Control request failed and the sender was told so
    ControlFailed(ControlRequest),
}

/// Routes envelopes between registered clients
pub struct MessageRouter {
    registry: Registry,
    limiter: Arc<dyn RateLimiter>,
    ice: Arc<dyn IceServerProvider>,
}

impl MessageRouter {
    pub fn new(
        registry: Registry,
        limiter: Arc<dyn RateLimiter>,
        ice: Arc<dyn IceServerProvider>,
    ) -> Self {
        Self {
            registry,
            limiter,
            ice,
        }
    }

    /// Decode and route a text frame received on `sender`'s connection
    pub async fn route_text(&self, sender: &Registration, text: &str) -> RouteOutcome {
        match Envelope::from_client_json(text) {
            Ok(envelope) => self.route(sender, envelope).await,
            Err(e) => {
                tracing::debug!(client_id = %sender.client_id(), error = %e, "Dropping malformed envelope");
                RouteOutcome::Malformed
            }
        }
    }

    /// Route an envelope received on `sender`'s connection
    pub async fn route(&self, sender: &Registration, mut envelope: Envelope) -> RouteOutcome {
        let from = sender.client_id();
        envelope.stamp_sender(from);

        if let Some(request) = envelope.kind.control() {
            return self.handle_control(sender, request).await;
        }

        let Some(to) = envelope.target().cloned() else {
            tracing::trace!(client_id = %from, kind = %envelope.kind, "Envelope without target dropped");
            return RouteOutcome::NoTarget;
        };

        let payload = match envelope.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(client_id = %from, error = %e, "Failed to serialize envelope");
                return RouteOutcome::Malformed;
            }
        };

        match self.registry.send_to(&to, payload).await {
            Ok(()) => {
                tracing::trace!(from = %from, to = %to, kind = %envelope.kind, "Envelope forwarded");
                RouteOutcome::Forwarded { to }
            }
            Err(e) => {
                tracing::debug!(from = %from, to = %to, error = %e, "Envelope not delivered");
                RouteOutcome::Undeliverable(e)
            }
        }
    }

    async fn handle_control(&self, sender: &Registration, request: ControlRequest) -> RouteOutcome {
        let from = sender.client_id();
        match request {
            ControlRequest::IceServers => {
                if !self.limiter.allow(from) {
                    tracing::debug!(client_id = %from, request = request.as_str(), "Control request rate limited");
                    self.reply(sender, Envelope::error(from.clone(), request, REASON_RATE_LIMITED))
                        .await;
                    return RouteOutcome::RateLimited(request);
                }

                match self.ice.ice_servers(from).await {
                    Ok(servers) => {
                        self.reply(sender, Envelope::ice_servers(from.clone(), &servers))
                            .await;
                        RouteOutcome::ControlReplied(request)
                    }
                    Err(e) => {
                        tracing::warn!(client_id = %from, error = %e, "ICE server provider failed");
                        self.reply(
                            sender,
                            Envelope::error(from.clone(), request, REASON_ICE_UNAVAILABLE),
                        )
                        .await;
                        RouteOutcome::ControlFailed(request)
                    }
                }
            }
        }
    }

    async fn reply(&self, to: &Registration, envelope: Envelope) {
        let payload = match envelope.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(client_id = %to.client_id(), error = %e, "Failed to serialize reply");
                return;
            }
        };
        if let Err(e) = self.registry.send_to_registration(to, payload).await {
            tracing::debug!(
                client_id = %to.client_id(),
                generation = to.generation(),
                error = %e,
                "Reply not delivered"
            );
        }
    }
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
