//! Background reclamation of expired sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::manager::Shared;

/// Handle to a running pruner task.
pub(crate) struct PrunerHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl PrunerHandle {
    /// Signal the task to stop without waiting for it.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stop the task and wait for it. A sweep already in progress completes.
    pub(crate) async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            debug!(error = %e, "Session pruner task ended abnormally");
        }
    }
}

/// Spawn the pruner loop. Must be called from within a Tokio runtime.
pub(crate) fn spawn_pruner(shared: Arc<Shared>, period: Duration) -> PrunerHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let handle = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let reclaimed = shared.sweep();
                    if reclaimed > 0 {
                        debug!(reclaimed, "Session sweep completed");
                    }
                    trace!(live_sessions = shared.index.len(), "Session store status");
                }
            }
        }

        debug!("Session pruner stopped");
    });

    PrunerHandle { cancel, handle }
}
