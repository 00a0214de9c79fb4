//! Per-client cooldown limiter
//!
//! At most one grant per window per client. Each grant records the time it was
//! made, so the next window starts from the last granted call. Denied calls leave
//! the window where it is.

use super::RateLimiter;
use dashmap::{mapref::entry::Entry, DashMap};
use relay_core::ClientId;
use std::time::{Duration, Instant};

/// Default cooldown between two grants for the same client
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

/// Sliding cooldown keyed by client id
#[derive(Debug)]
pub struct CooldownLimiter {
    window: Duration,
    last_granted: DashMap<ClientId, Instant>,
}

impl CooldownLimiter {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_granted: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// `allow` against an explicit clock
    ///
    /// The check and the record happen under the entry's shard lock, so among
    /// simultaneous callers for one client at most one is granted.
    pub fn allow_at(&self, client: &ClientId, now: Instant) -> bool {
        match self.last_granted.entry(client.clone()) {
            Entry::Occupied(mut last) => {
                if now.saturating_duration_since(*last.get()) >= self.window {
                    last.insert(now);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
                true
            }
        }
    }

    /// Drop the state for a client that has gone away
    pub fn forget(&self, client: &ClientId) {
        self.last_granted.remove(client);
    }

    /// Remove entries whose window has elapsed, returning how many were dropped
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.last_granted.len();
        self.last_granted
            .retain(|_, last| now.saturating_duration_since(*last) < self.window);
        before.saturating_sub(self.last_granted.len())
    }

    /// Number of clients currently tracked
    pub fn len(&self) -> usize {
        self.last_granted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_granted.is_empty()
    }
}

impl Default for CooldownLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl RateLimiter for CooldownLimiter {
    fn allow(&self, client: &ClientId) -> bool {
        self.allow_at(client, Instant::now())
    }
}
