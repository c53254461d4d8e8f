//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default max body size for REST requests (1 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Default API version clients must announce.
pub const DEFAULT_API_VERSION: &str = "v1";

/// Header carrying the client's API version.
pub const API_VERSION_HEADER: &str = "SC-Api-version";

/// Default time allowed for open connections to finish on shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Default blocklist refresh period (12 hours).
pub const DEFAULT_BLOCKLIST_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

/// Default negative-score pruning period (6 hours).
pub const DEFAULT_COUPON_PRUNE_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Default period for dropping idle rate limiter entries (1 minute).
pub const DEFAULT_LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Default blocklist source.
pub const DEFAULT_BLOCKLIST_SOURCE: &str = "https://lists.blocklist.de/lists/all.txt";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Debug mode. Disables the API-version check.
    pub debug: bool,

    /// API version expected in the `SC-Api-version` header.
    pub api_version: String,

    /// Enable rate limiting.
    pub rate_limiting: bool,

    /// Rate limit: requests per minute per client address.
    pub api_rpm: u32,

    /// Enable request logging.
    pub request_logging: bool,

    /// Maximum REST request body size in bytes.
    pub max_body_size: usize,

    /// How long graceful shutdown waits for open connections.
    pub shutdown_timeout: Duration,

    // ─────────────────────────────────────────────────────────────────────────
    // Maintenance jobs
    // ─────────────────────────────────────────────────────────────────────────
    /// URLs of plain-text IP blocklists. Empty disables the refresh job.
    pub blocklist_sources: Vec<String>,

    /// How often the blocklists are fetched again.
    pub blocklist_interval: Duration,

    /// How often coupons with a negative score are deleted.
    pub coupon_prune_interval: Duration,

    /// How often rate limiter state for idle clients is dropped.
    pub limiter_cleanup_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            debug: false,
            api_version: DEFAULT_API_VERSION.to_string(),
            rate_limiting: true,
            api_rpm: 120,
            request_logging: true,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            blocklist_sources: vec![DEFAULT_BLOCKLIST_SOURCE.to_string()],
            blocklist_interval: DEFAULT_BLOCKLIST_INTERVAL,
            coupon_prune_interval: DEFAULT_COUPON_PRUNE_INTERVAL,
            limiter_cleanup_interval: DEFAULT_LIMITER_CLEANUP_INTERVAL,
        }
    }
}

impl ServerConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Enable or disable debug mode.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the expected API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Enable or disable rate limiting.
    pub fn with_rate_limiting(mut self, enabled: bool) -> Self {
        self.rate_limiting = enabled;
        self
    }

    /// Set the API rate limit (requests per minute per client).
    pub fn with_api_rpm(mut self, rpm: u32) -> Self {
        self.api_rpm = rpm;
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Set the maximum REST request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Set the graceful shutdown deadline.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Replace the blocklist sources.
    pub fn with_blocklist_sources(mut self, sources: Vec<String>) -> Self {
        self.blocklist_sources = sources;
        self
    }

    /// Set the blocklist refresh period.
    pub fn with_blocklist_interval(mut self, interval: Duration) -> Self {
        self.blocklist_interval = interval;
        self
    }

    /// Set the negative-score pruning period.
    pub fn with_coupon_prune_interval(mut self, interval: Duration) -> Self {
        self.coupon_prune_interval = interval;
        self
    }

    /// Set the rate limiter cleanup period.
    pub fn with_limiter_cleanup_interval(mut self, interval: Duration) -> Self {
        self.limiter_cleanup_interval = interval;
        self
    }
}
