//! Access guards for API routes.
//!
//! Two checks run before any handler: the client must not be on the ban
//! list, and it must announce the API version this server speaks.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::USER_AGENT,
    middleware::Next,
    response::Response,
};

use crate::client_ip::resolve_client_ip;
use crate::config::API_VERSION_HEADER;
use crate::error::ServerError;
use crate::state::AppState;

fn user_agent(request: &Request<Body>) -> &str {
    request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Reject clients whose address is on the ban list.
///
/// A ban list lookup failure rejects the request with `503`.
pub async fn ip_ban_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ServerError> {
    let ip = resolve_client_ip(request.headers(), request.extensions())
        .ok_or_else(|| ServerError::BadRequest("Cannot determine client address".to_string()))?;

    match state.store.is_banned(&ip.to_string()) {
        Ok(false) => Ok(next.run(request).await),
        Ok(true) => {
            tracing::warn!(
                ip = %ip,
                user_agent = %user_agent(&request),
                path = %request.uri().path(),
                "Blocked request due to IP being on a blocklist"
            );
            Err(ServerError::Forbidden("Forbidden".to_string()))
        }
        Err(e) => {
            tracing::error!(
                ip = %ip,
                user_agent = %user_agent(&request),
                path = %request.uri().path(),
                error = %e,
                "Error checking request against the ban list"
            );
            Err(ServerError::ServiceUnavailable("Ban list unavailable".to_string()))
        }
    }
}

/// Require the `SC-Api-version` header to match the configured version.
///
/// Skipped entirely in debug mode.
pub async fn api_version_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ServerError> {
    if state.config.debug {
        return Ok(next.run(request).await);
    }

    let received = request
        .headers()
        .get(API_VERSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or("");

    if received != state.config.api_version {
        let ip = resolve_client_ip(request.headers(), request.extensions());
        tracing::warn!(
            ip = ?ip,
            received_version = %received,
            expected_version = %state.config.api_version,
            path = %request.uri().path(),
            "Blocked request due to invalid API version header"
        );
        return Err(ServerError::Forbidden("Forbidden".to_string()));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::{
        Router,
        http::{Request, StatusCode},
        middleware,
        routing::get,
    };
    use tower::ServiceExt;

    async fn test_handler() -> &'static str {
        "ok"
    }

    fn ban_router(state: AppState) -> Router {
        Router::new()
            .route("/test", get(test_handler))
            .layer(middleware::from_fn_with_state(state.clone(), ip_ban_middleware))
            .with_state(state)
    }

    fn version_router(state: AppState) -> Router {
        Router::new()
            .route("/test", get(test_handler))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                api_version_middleware,
            ))
            .with_state(state)
    }

    fn request(ip: &str, version: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/test").header("x-real-ip", ip);
        if let Some(v) = version {
            builder = builder.header(API_VERSION_HEADER, v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_banned_ip_is_forbidden() {
        let state = AppState::for_tests(ServerConfig::new());
        state.store.insert_bans(["203.0.113.50"]).unwrap();
        let app = ban_router(state);

        let banned = app.clone().oneshot(request("203.0.113.50", None)).await.unwrap();
        assert_eq!(banned.status(), StatusCode::FORBIDDEN);

        let allowed = app.oneshot(request("203.0.113.51", None)).await.unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_client_address_is_rejected() {
        let app = ban_router(AppState::for_tests(ServerConfig::new()));
        let response = app
            .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_version_header_required() {
        let app = version_router(AppState::for_tests(ServerConfig::new()));

        let missing = app.clone().oneshot(request("192.0.2.1", None)).await.unwrap();
        assert_eq!(missing.status(), StatusCode::FORBIDDEN);

        let wrong = app.clone().oneshot(request("192.0.2.1", Some("v2"))).await.unwrap();
        assert_eq!(wrong.status(), StatusCode::FORBIDDEN);

        let padded = app.oneshot(request("192.0.2.1", Some("  v1 "))).await.unwrap();
        assert_eq!(padded.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_version_check_skipped_in_debug() {
        let app = version_router(AppState::for_tests(ServerConfig::new().with_debug(true)));
        let response = app.oneshot(request("192.0.2.1", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
