//! HTTP API server for SugarCube.
//!
//! Serves coupon lookups for sites, accepts new sites and coupons, and
//! applies the results clients report back through the callback endpoint.
//! Every lookup opens a short-lived correlation session; the callback must
//! quote its id before the session expires.
//!
//! # Features
//!
//! - REST API under `/api`
//! - Per-client rate limiting
//! - IP ban list with periodic blocklist refresh
//! - API-version header check
//! - Security response headers
//! - Request logging
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sugarcube_server::{AppState, Server, ServerConfig};
//! use sugarcube_session::{SessionConfig, SessionManager};
//! use sugarcube_store::CouponStore;
//!
//! let sessions = Arc::new(SessionManager::new(SessionConfig::default()));
//! let store = Arc::new(CouponStore::open("sugarcube.db")?);
//! let server = Server::new(AppState::new(ServerConfig::new(), sessions, store));
//! server.run().await?;
//! ```

pub mod client_ip;
pub mod config;
pub mod error;
pub mod guard;
pub mod headers;
pub mod jobs;
pub mod ratelimit;
pub mod routes;
pub mod state;

pub use client_ip::{ClientIp, resolve_client_ip};
pub use config::ServerConfig;
pub use error::{ErrorResponse, Result, ServerError};
pub use jobs::{BackgroundJobs, spawn_maintenance};
pub use state::AppState;

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;

use axum::{Router, middleware};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// The SugarCube HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a server from application state.
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Shared application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::health_routes())
            .nest("/api", self.api_routes())
            // Request logging (inner layer)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                ratelimit::request_logging_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                headers::global_headers_middleware,
            ))
            .layer(RequestBodyLimitLayer::new(self.state.config.max_body_size))
            // TraceLayer for detailed HTTP tracing
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// API routes.
    ///
    /// Guarded by, in order: rate limiting, the IP ban list and the
    /// API-version check.
    fn api_routes(&self) -> Router<AppState> {
        use axum::routing::{get, post};

        Router::new()
            .route(
                "/coupons",
                get(routes::get_coupons_handler).post(routes::add_coupon_handler),
            )
            .route("/site", post(routes::add_site_handler))
            .route("/callback", post(routes::callback_handler))
            // Innermost: API version
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                guard::api_version_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                guard::ip_ban_middleware,
            ))
            // Outermost: rate limiting
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                ratelimit::rate_limit_middleware,
            ))
    }

    /// Serve on `listener` until `shutdown` resolves.
    ///
    /// Peer addresses are recorded for client-address resolution. Once
    /// `shutdown` resolves, open connections get `shutdown_timeout` to
    /// finish before the server stops waiting for them.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let grace = self.state.config.shutdown_timeout;

        if let Ok(addr) = listener.local_addr() {
            info!("Listening on {}", addr);
        }

        let draining = CancellationToken::new();
        let signal = draining.clone();
        let server = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.await;
            signal.cancel();
        })
        .into_future();

        let deadline = async {
            draining.cancelled().await;
            tokio::time::sleep(grace).await;
        };

        tokio::select! {
            result = server => {
                result.map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;
            }
            _ = deadline => {
                warn!(
                    timeout_ms = grace.as_millis() as u64,
                    "Graceful shutdown timed out, abandoning open connections"
                );
            }
        }

        info!("Server stopped");
        Ok(())
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.state.config.bind_address;

        info!("Starting server on {}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

        self.serve(listener, shutdown).await
    }

    /// Run the server until the process ends.
    pub async fn run(self) -> Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}
