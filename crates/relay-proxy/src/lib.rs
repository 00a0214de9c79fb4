//! # relay-proxy
//!
//! Accepts authenticated client WebSockets and relays each one, message for
//! message, to its own connection on a fixed upstream.

pub mod relay;
pub mod server;
pub mod upstream;

pub use server::run;
