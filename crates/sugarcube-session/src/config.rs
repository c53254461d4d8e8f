//! Configuration for the session manager.

use std::time::Duration;

/// Default lifetime of a session (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default interval between background sweeps.
pub const DEFAULT_PRUNE_INTERVAL: Duration = Duration::from_secs(3);

/// Configuration for the session manager.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Time-to-live applied to every session at creation.
    pub ttl: Duration,

    /// How often the pruner drains expired sessions.
    /// Bounds how long an expired session can linger in memory.
    pub prune_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            prune_interval: DEFAULT_PRUNE_INTERVAL,
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the pruner interval. Zero is clamped to one millisecond.
    pub fn with_prune_interval(mut self, interval: Duration) -> Self {
        self.prune_interval = interval.max(Duration::from_millis(1));
        self
    }
}
