//! Security and application metadata headers added to every response.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, header},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Application name advertised in `X-App-Name`.
pub const APP_NAME: &str = "Sugarcube";

const SECURITY_HEADERS: [(HeaderName, &str); 8] = [
    (
        header::STRICT_TRANSPORT_SECURITY,
        "max-age=63072000; includeSubDomains; preload",
    ),
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::X_XSS_PROTECTION, "1; mode=block"),
    (header::REFERRER_POLICY, "no-referrer"),
    (header::CONTENT_SECURITY_POLICY, "default-src 'self'"),
    (
        HeaderName::from_static("permissions-policy"),
        "interest-cohort=()",
    ),
    (header::CACHE_CONTROL, "no-store"),
];

/// Set the global response headers.
pub async fn global_headers_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }

    headers.insert("x-app-name", HeaderValue::from_static(APP_NAME));
    headers.insert(
        "x-app-version",
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    if let Ok(version) = HeaderValue::from_str(&state.config.api_version) {
        headers.insert("x-api-version", version);
    }

    response
}
