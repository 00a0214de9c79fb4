//! # relay-hub
//!
//! WebRTC signaling hub: tracks which clients are connected, forwards signaling
//! envelopes between them and answers ICE server requests.

pub mod connection;
pub mod ratelimit;
pub mod router;
pub mod server;

pub use server::run;
