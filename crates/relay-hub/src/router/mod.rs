//! Envelope routing

mod message_router;

pub use message_router::{MessageRouter, RouteOutcome, REASON_ICE_UNAVAILABLE, REASON_RATE_LIMITED};
