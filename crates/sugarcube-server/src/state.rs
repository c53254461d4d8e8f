//! Application state shared across handlers.

use std::sync::Arc;

use sugarcube_session::SessionManager;
use sugarcube_store::CouponStore;

use crate::config::ServerConfig;
use crate::ratelimit::{SharedRateLimiter, create_rate_limiter};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Correlation sessions handed out with coupon lookups.
    pub sessions: Arc<SessionManager>,

    /// Sites, coupons and the ban list.
    pub store: Arc<CouponStore>,

    /// Per-client request limiter.
    pub limiter: SharedRateLimiter,
}

impl AppState {
    /// Create a new application state.
    pub fn new(config: ServerConfig, sessions: Arc<SessionManager>, store: Arc<CouponStore>) -> Self {
        let limiter = create_rate_limiter(config.api_rpm);
        Self {
            config: Arc::new(config),
            sessions,
            store,
            limiter,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State over an in-memory store and a default session manager.
    pub(crate) fn for_tests(config: ServerConfig) -> Self {
        use sugarcube_session::SessionConfig;

        let store = CouponStore::open_in_memory().expect("in-memory store");
        Self::new(
            config,
            Arc::new(SessionManager::new(SessionConfig::default())),
            Arc::new(store),
        )
    }
}
