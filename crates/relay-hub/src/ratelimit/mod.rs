//! Control-plane rate limiting

mod cooldown;

pub use cooldown::{CooldownLimiter, DEFAULT_COOLDOWN};

use relay_core::ClientId;

/// Decides whether a client may perform a rate-limited action now
pub trait RateLimiter: Send + Sync {
    /// Returns `true` if granted; a grant starts a new window for `client`
    fn allow(&self, client: &ClientId) -> bool;
}
