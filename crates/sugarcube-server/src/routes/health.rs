//! Liveness endpoint.
//!
//! Mounted outside `/api`, so health checks need neither the version header
//! nor a clean ban list entry.

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Liveness report.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: String,
    /// Build version.
    pub version: String,
    /// API version clients must send in `SC-Api-version`.
    pub api_version: String,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_version: state.config.api_version.clone(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::headers::global_headers_middleware;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_versions_and_headers() {
        let state = AppState::for_tests(ServerConfig::new().with_api_version("v7"));
        let app = health_routes()
            .layer(middleware::from_fn_with_state(
                state.clone(),
                global_headers_middleware,
            ))
            .with_state(state);

        // No version header, no forwarded address.
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-api-version"], "v7");
        assert_eq!(response.headers()["cache-control"], "no-store");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(health.api_version, "v7");
    }
}
