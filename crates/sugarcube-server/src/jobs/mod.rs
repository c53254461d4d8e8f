//! Periodic maintenance jobs.
//!
//! Each job is a tokio task driven by an interval and stopped through a
//! shared cancellation token.

pub mod blocklist;
pub mod coupons;

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ratelimit::evict_idle_clients;
use crate::state::AppState;

/// Handles to the running maintenance jobs.
#[derive(Debug, Default)]
pub struct BackgroundJobs {
    cancel: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl BackgroundJobs {
    /// Create an empty job set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` every `period` until shutdown.
    ///
    /// With `run_immediately` the first run happens right away, otherwise
    /// after one full period.
    pub fn spawn_periodic<F, Fut>(
        &mut self,
        name: &'static str,
        period: Duration,
        run_immediately: bool,
        job: F,
    ) where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            if !run_immediately {
                ticker.tick().await;
            }

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        debug!(job = name, "Running maintenance job");
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break,
                            _ = job() => {}
                        }
                    }
                }
            }

            debug!(job = name, "Maintenance job stopped");
        });

        self.handles.push((name, handle));
    }

    /// Number of spawned jobs.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no job was spawned.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Cancel every job and wait for them to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for (name, handle) in self.handles {
            if let Err(e) = handle.await {
                warn!(job = name, error = %e, "Maintenance job ended abnormally");
            }
        }
        info!("Maintenance jobs stopped");
    }
}

/// Spawn the blocklist refresh, coupon pruning and rate limiter cleanup
/// jobs for `state`.
///
/// The blocklist job is skipped when no sources are configured, the limiter
/// cleanup when rate limiting is off.
pub fn spawn_maintenance(state: &AppState) -> BackgroundJobs {
    let mut jobs = BackgroundJobs::new();
    let config = state.config.clone();

    if config.blocklist_sources.is_empty() {
        info!("No blocklist sources configured, blocklist refresh disabled");
    } else {
        let client = reqwest::Client::new();
        let store = state.store.clone();
        let sources = config.blocklist_sources.clone();
        jobs.spawn_periodic("blocklist", config.blocklist_interval, true, move || {
            let client = client.clone();
            let store = store.clone();
            let sources = sources.clone();
            async move {
                blocklist::refresh_blocklist(&client, store, &sources).await;
            }
        });
    }

    let store = state.store.clone();
    jobs.spawn_periodic(
        "coupon_prune",
        config.coupon_prune_interval,
        false,
        move || {
            let store = store.clone();
            async move {
                coupons::prune_negative_scores(store).await;
            }
        },
    );

    if config.rate_limiting {
        let limiter = state.limiter.clone();
        jobs.spawn_periodic(
            "limiter_cleanup",
            config.limiter_cleanup_interval,
            false,
            move || {
                let limiter = limiter.clone();
                async move {
                    let evicted = evict_idle_clients(&limiter);
                    if evicted > 0 {
                        debug!(evicted, remaining = limiter.len(), "Dropped idle rate limiter entries");
                    }
                }
            },
        );
    }

    jobs
}
