//! Error types for session validation.

use crate::session::SessionId;

/// Reasons a session cannot be used.
///
/// Both variants are ordinary outcomes of validation; callers map them to a
/// request-level rejection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The identifier was never issued, or was already removed or reclaimed.
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    /// The identifier is known but its deadline has passed.
    #[error("Session expired: {0}")]
    Expired(SessionId),
}

impl SessionError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::NotFound(_) => "session_not_found",
            SessionError::Expired(_) => "session_expired",
        }
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
