//! Duplex message relay
//!
//! Transport-neutral forwarding between two WebSocket connections, plus the
//! adapters that plug axum and tungstenite sockets into it.

mod duplex;
mod frame;
pub mod ws;

pub use duplex::{Direction, DirectionEnd, DirectionReport, DuplexRelay, RelayOutcome};
pub use frame::{RelayError, RelayFrame};
