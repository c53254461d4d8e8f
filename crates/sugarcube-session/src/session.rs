//! Session record and identifier.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque session identifier (random 128-bit value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A short-lived correlation token binding a request to a future callback.
///
/// Sessions are immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    /// Lookup key, never reused.
    pub id: SessionId,

    /// Address of the request that created the session. Not interpreted here.
    pub client_addr: IpAddr,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// Absolute deadline; the session is unusable at or after this instant.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a session for `client_addr` starting at `now` and living for `ttl`.
    pub fn new(client_addr: IpAddr, now: DateTime<Utc>, ttl: std::time::Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Self {
            id: SessionId::new(),
            client_addr,
            created_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Whether the session has expired as of `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
