//! Rate limiting middleware using governor.
//!
//! Provides per-client rate limiting for API endpoints to prevent abuse.

use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    DefaultKeyedRateLimiter, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
};

use crate::client_ip::resolve_client_ip;
use crate::error::ErrorResponse;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Rate limiter keyed by client address (uses default clock).
pub type SharedRateLimiter = Arc<DefaultKeyedRateLimiter<IpAddr>>;

// ─────────────────────────────────────────────────────────────────────────────
// Rate Limiter Factory
// ─────────────────────────────────────────────────────────────────────────────

/// Create a per-client rate limiter with the specified requests per minute.
///
/// A zero rate is treated as one request per minute.
pub fn create_rate_limiter(requests_per_minute: u32) -> SharedRateLimiter {
    let quota = Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::keyed(quota))
}

/// Drop limiter state for clients that are back to a full quota.
///
/// Keys come from client-supplied headers and are never dropped otherwise.
/// Returns the number of keys removed.
pub fn evict_idle_clients(limiter: &SharedRateLimiter) -> usize {
    let before = limiter.len();
    limiter.retain_recent();
    limiter.shrink_to_fit();
    before.saturating_sub(limiter.len())
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Rate limiting middleware for API endpoints.
///
/// Requests whose client address cannot be resolved are not limited here;
/// the handlers reject them.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.rate_limiting {
        return next.run(request).await;
    }

    let Some(ip) = resolve_client_ip(request.headers(), request.extensions()) else {
        return next.run(request).await;
    };

    match state.limiter.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(not_until) => {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            // Round up so clients never retry early.
            let retry_after = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
            let retry_after = retry_after.max(1);

            tracing::warn!(
                ip = %ip,
                path = %request.uri().path(),
                retry_after_seconds = retry_after,
                "Rate limit exceeded"
            );

            let error = ErrorResponse {
                code: "rate_limit_exceeded".to_string(),
                message: "Rate limit exceeded".to_string(),
            };

            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after.to_string())],
                Json(error),
            )
                .into_response()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Structured request logging middleware.
///
/// Logs method, path, client address, status and duration.
pub async fn request_logging_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.request_logging {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let ip = resolve_client_ip(request.headers(), request.extensions())
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            ip = %ip,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            path = %path,
            ip = %ip,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            ip = %ip,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
