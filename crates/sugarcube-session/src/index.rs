//! Concurrent index of live sessions.

use dashmap::DashMap;

use crate::session::{Session, SessionId};

/// Thread-safe map from session ID to session.
///
/// Single-key operations are linearizable; callers never lock. The index
/// knows nothing about the expiry queue.
#[derive(Debug, Default)]
pub struct SessionIndex {
    sessions: DashMap<SessionId, Session>,
}

impl SessionIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a session under its ID.
    pub fn insert(&self, session: Session) {
        self.sessions.insert(session.id, session);
    }

    /// Look up a session by ID.
    pub fn get(&self, id: &SessionId) -> Option<Session> {
        self.sessions.get(id).map(|entry| *entry.value())
    }

    /// Remove a session. Removing an absent ID is a no-op.
    pub fn remove(&self, id: &SessionId) -> Option<Session> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    /// Whether a session is present (regardless of expiry).
    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Number of sessions currently stored.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    fn session() -> Session {
        Session::new("127.0.0.1".parse().unwrap(), Utc::now(), Duration::from_secs(60))
    }

    #[test]
    fn test_insert_and_get() {
        let index = SessionIndex::new();
        let s = session();
        index.insert(s);

        assert_eq!(index.get(&s.id), Some(s));
        assert!(index.contains(&s.id));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let index = SessionIndex::new();
        assert_eq!(index.get(&SessionId::new()), None);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let index = SessionIndex::new();
        let s = session();
        index.insert(s);

        assert_eq!(index.remove(&s.id), Some(s));
        assert_eq!(index.remove(&s.id), None);
        assert_eq!(index.remove(&SessionId::new()), None);
        assert!(index.is_empty());
    }
}
