//! Session manager facade.

use std::net::IpAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::index::SessionIndex;
use crate::pruner::{PrunerHandle, spawn_pruner};
use crate::queue::ExpiryQueue;
use crate::session::{Session, SessionId};

/// State shared between the manager and its pruner task.
pub(crate) struct Shared {
    pub(crate) index: SessionIndex,

    /// Guarded separately from the index; the two locks are never held together.
    queue: Mutex<ExpiryQueue<SessionId>>,

    clock: Arc<dyn Clock>,

    config: SessionConfig,
}

impl Shared {
    /// Drain every expired queue entry and drop it from the index.
    ///
    /// Returns the number of sessions removed from the index. Queue entries
    /// whose session was already removed are discarded without counting.
    pub(crate) fn sweep(&self) -> usize {
        let now = self.clock.now();
        let expired = self.queue.lock().pop_expired(now);

        expired
            .iter()
            .filter(|id| self.index.remove(id).is_some())
            .count()
    }
}

enum PrunerState {
    Idle,
    Running(PrunerHandle),
    Stopped,
}

/// Issues, validates and reclaims short-lived sessions.
///
/// Construct one instance at startup and share it behind an `Arc`.
pub struct SessionManager {
    shared: Arc<Shared>,
    pruner: Mutex<PrunerState>,
}

impl SessionManager {
    /// Create a manager using the system clock.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a manager with a custom time source.
    pub fn with_clock(config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                index: SessionIndex::new(),
                queue: Mutex::new(ExpiryQueue::new()),
                clock,
                config,
            }),
            pruner: Mutex::new(PrunerState::Idle),
        }
    }

    /// Get the manager configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Issue a new session for `client_addr` and return its ID.
    pub fn create_session(&self, client_addr: IpAddr) -> SessionId {
        let session = Session::new(client_addr, self.shared.clock.now(), self.shared.config.ttl);
        let id = session.id;

        self.shared.index.insert(session);
        self.shared.queue.lock().push(session.expires_at, id);

        trace!(session_id = %id, client = %client_addr, "Session created");
        id
    }

    /// Check that a session exists and has not expired.
    ///
    /// An expired session is removed from the index as a side effect. A valid
    /// session is left in place; call [`remove_session`](Self::remove_session)
    /// once it has been consumed.
    pub fn validate_session(&self, id: &SessionId) -> Result<Session> {
        let session = self
            .shared
            .index
            .get(id)
            .ok_or(SessionError::NotFound(*id))?;

        if session.is_expired_at(self.shared.clock.now()) {
            debug!(session_id = %id, "Session expired, removing from index");
            self.remove_session(id);
            return Err(SessionError::Expired(*id));
        }

        Ok(session)
    }

    /// Validate a session and remove it in one step.
    ///
    /// The removal happens first, so of several concurrent callers holding
    /// the same ID at most one receives the session; the others see
    /// `NotFound`. An expired session is still removed and reported as
    /// `Expired`.
    pub fn take_session(&self, id: &SessionId) -> Result<Session> {
        let session = self
            .shared
            .index
            .remove(id)
            .ok_or(SessionError::NotFound(*id))?;

        if session.is_expired_at(self.shared.clock.now()) {
            debug!(session_id = %id, "Session expired when taken");
            return Err(SessionError::Expired(*id));
        }

        trace!(session_id = %id, "Session taken");
        Ok(session)
    }

    /// Remove a session from the index. Unknown IDs are ignored.
    ///
    /// The queue entry stays behind and is discarded by a later sweep, which
    /// keeps this path off the queue lock.
    pub fn remove_session(&self, id: &SessionId) {
        if self.shared.index.remove(id).is_some() {
            trace!(session_id = %id, "Session removed");
        }
    }

    /// Start the background pruner.
    ///
    /// Only the first call starts a task; later calls (including after
    /// [`shutdown`](Self::shutdown)) return `false`. Must be called from
    /// within a Tokio runtime.
    pub fn start_pruner(&self) -> bool {
        let mut state = self.pruner.lock();
        if !matches!(*state, PrunerState::Idle) {
            return false;
        }

        let period = self.shared.config.prune_interval;
        *state = PrunerState::Running(spawn_pruner(Arc::clone(&self.shared), period));
        debug!(interval_ms = period.as_millis() as u64, "Session pruner started");
        true
    }

    /// Stop the pruner and wait for it to finish its current sweep.
    pub async fn shutdown(&self) {
        let handle = match std::mem::replace(&mut *self.pruner.lock(), PrunerState::Stopped) {
            PrunerState::Running(handle) => Some(handle),
            PrunerState::Idle | PrunerState::Stopped => None,
        };

        if let Some(handle) = handle {
            handle.stop().await;
        }
    }

    /// Run one reclamation pass now. Returns the number of sessions removed.
    pub fn sweep_expired(&self) -> usize {
        self.shared.sweep()
    }

    /// Current store statistics.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            live: self.shared.index.len(),
            queued: self.shared.queue.lock().len(),
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let PrunerState::Running(handle) = &*self.pruner.get_mut() {
            handle.cancel();
        }
    }
}

/// Session store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Sessions present in the index (may include expired, unswept ones).
    pub live: usize,

    /// Entries in the expiry queue, including stale ones for removed sessions.
    pub queued: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::collections::HashSet;
    use std::time::Duration;

    fn manual_manager() -> (SessionManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let manager = SessionManager::with_clock(SessionConfig::default(), clock.clone());
        (manager, clock)
    }

    fn addr() -> IpAddr {
        "10.0.0.5".parse().unwrap()
    }

    #[test]
    fn test_create_and_validate() {
        let (manager, _clock) = manual_manager();
        let id = manager.create_session(addr());

        let session = manager.validate_session(&id).unwrap();
        assert_eq!(session.id, id);
        assert_eq!(session.client_addr, addr());

        // Validation does not consume the session.
        assert!(manager.validate_session(&id).is_ok());
        assert_eq!(manager.stats(), SessionStats { live: 1, queued: 1 });
    }

    #[test]
    fn test_ids_are_unique() {
        let (manager, _clock) = manual_manager();
        let ids: HashSet<_> = (0..1000).map(|_| manager.create_session(addr())).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_unknown_session_not_found() {
        let (manager, _clock) = manual_manager();
        let id = SessionId::new();
        assert_eq!(manager.validate_session(&id), Err(SessionError::NotFound(id)));
    }

    #[test]
    fn test_expiry_scenario() {
        let (manager, clock) = manual_manager();
        let id = manager.create_session(addr());

        clock.advance(Duration::from_secs(1));
        assert!(manager.validate_session(&id).is_ok());

        clock.advance(Duration::from_secs(300));
        assert_eq!(manager.validate_session(&id), Err(SessionError::Expired(id)));

        // Lazy expiry removed it from the index.
        assert_eq!(manager.validate_session(&id), Err(SessionError::NotFound(id)));
    }

    #[test]
    fn test_expired_at_exact_deadline() {
        let (manager, clock) = manual_manager();
        let id = manager.create_session(addr());

        clock.advance(Duration::from_secs(299));
        assert!(manager.validate_session(&id).is_ok());

        clock.advance(Duration::from_secs(1));
        assert_eq!(manager.validate_session(&id), Err(SessionError::Expired(id)));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (manager, _clock) = manual_manager();
        let id = manager.create_session(addr());

        manager.remove_session(&id);
        manager.remove_session(&id);
        manager.remove_session(&SessionId::new());

        assert_eq!(manager.validate_session(&id), Err(SessionError::NotFound(id)));
    }

    #[test]
    fn test_take_consumes_session() {
        let (manager, _clock) = manual_manager();
        let id = manager.create_session(addr());

        let session = manager.take_session(&id).unwrap();
        assert_eq!(session.id, id);
        assert_eq!(manager.take_session(&id), Err(SessionError::NotFound(id)));
        assert_eq!(manager.validate_session(&id), Err(SessionError::NotFound(id)));
    }

    #[test]
    fn test_take_expired_session() {
        let (manager, clock) = manual_manager();
        let id = manager.create_session(addr());

        clock.advance(Duration::from_secs(300));
        assert_eq!(manager.take_session(&id), Err(SessionError::Expired(id)));
        assert_eq!(manager.stats().live, 0);
        assert_eq!(manager.take_session(&id), Err(SessionError::NotFound(id)));
    }

    #[test]
    fn test_remove_leaves_queue_entry_for_sweep() {
        let (manager, clock) = manual_manager();
        let id = manager.create_session(addr());
        manager.remove_session(&id);

        assert_eq!(manager.stats(), SessionStats { live: 0, queued: 1 });

        // Not yet expired: the stale entry stays queued.
        assert_eq!(manager.sweep_expired(), 0);
        assert_eq!(manager.stats().queued, 1);

        clock.advance(Duration::from_secs(301));
        assert_eq!(manager.sweep_expired(), 0);
        assert_eq!(manager.stats(), SessionStats { live: 0, queued: 0 });
    }

    #[test]
    fn test_sweep_reclaims_only_expired() {
        let (manager, clock) = manual_manager();
        let old: Vec<_> = (0..3).map(|_| manager.create_session(addr())).collect();

        clock.advance(Duration::from_secs(200));
        let young = manager.create_session(addr());

        clock.advance(Duration::from_secs(100));
        assert_eq!(manager.sweep_expired(), 3);

        for id in &old {
            assert_eq!(manager.validate_session(id), Err(SessionError::NotFound(*id)));
        }
        assert!(manager.validate_session(&young).is_ok());
        assert_eq!(manager.stats(), SessionStats { live: 1, queued: 1 });
    }

    #[test]
    fn test_sweep_after_lazy_expiry() {
        let (manager, clock) = manual_manager();
        let id = manager.create_session(addr());

        clock.advance(Duration::from_secs(400));
        assert_eq!(manager.validate_session(&id), Err(SessionError::Expired(id)));

        // Already gone from the index, so nothing is counted.
        assert_eq!(manager.sweep_expired(), 0);
        assert_eq!(manager.stats().queued, 0);
    }

    #[tokio::test]
    async fn test_start_pruner_once() {
        let (manager, _clock) = manual_manager();
        assert!(manager.start_pruner());
        assert!(!manager.start_pruner());

        manager.shutdown().await;
        assert!(!manager.start_pruner());
    }

    #[tokio::test]
    async fn test_shutdown_without_start() {
        let (manager, _clock) = manual_manager();
        manager.shutdown().await;
        assert!(!manager.start_pruner());
    }

    #[tokio::test]
    async fn test_pruner_reclaims_expired_sessions() {
        let config = SessionConfig::new()
            .with_ttl(Duration::from_millis(50))
            .with_prune_interval(Duration::from_millis(20));
        let manager = SessionManager::new(config);
        manager.start_pruner();

        for _ in 0..10 {
            manager.create_session(addr());
        }
        assert_eq!(manager.stats().live, 10);

        // TTL + one period, with margin for scheduling.
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(manager.stats(), SessionStats { live: 0, queued: 0 });
        manager.shutdown().await;
    }
}
