//! Error types for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sugarcube_session::SessionError;
use sugarcube_store::StoreError;
use thiserror::Error;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The correlation session was rejected.
    #[error("Session rejected: {0}")]
    Session(#[from] SessionError),

    /// The client may not use the API.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Service unavailable.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database/storage error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => ServerError::NotFound(what),
            StoreError::AlreadyExists(what) => ServerError::Conflict(what),
            StoreError::InvalidData(msg) => ServerError::BadRequest(msg),
            StoreError::Database(e) => ServerError::Storage(e.to_string()),
            StoreError::Serialization(e) => ServerError::Storage(e.to_string()),
        }
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ServerError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::Session(e) => (StatusCode::UNAUTHORIZED, e.code()),
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ServerError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ServerError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ServerError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, code, error = %message, "Server error");
        } else {
            tracing::warn!(status = %status, code, error = %message, "Client error");
        }

        let body = ErrorResponse {
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sugarcube_session::SessionId;

    #[test]
    fn test_session_errors_map_to_unauthorized() {
        let id = SessionId::new();
        let not_found = ServerError::from(SessionError::NotFound(id));
        let expired = ServerError::from(SessionError::Expired(id));

        assert_eq!(
            not_found.status_and_code(),
            (StatusCode::UNAUTHORIZED, "session_not_found")
        );
        assert_eq!(
            expired.status_and_code(),
            (StatusCode::UNAUTHORIZED, "session_expired")
        );
    }

    #[test]
    fn test_store_errors_map_to_status() {
        let cases = [
            (StoreError::NotFound("site".into()), StatusCode::NOT_FOUND),
            (StoreError::AlreadyExists("site".into()), StatusCode::CONFLICT),
            (StoreError::InvalidData("empty".into()), StatusCode::BAD_REQUEST),
        ];

        for (err, status) in cases {
            assert_eq!(ServerError::from(err).status_and_code().0, status);
        }
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ServerError::Conflict("site 'a'".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "conflict");
        assert!(error.message.contains("site 'a'"));
    }
}
