//! Server boot and shutdown sequence.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use sugarcube_server::{AppState, Server, spawn_maintenance};
use sugarcube_session::SessionManager;
use sugarcube_store::CouponStore;

use crate::cli::Cli;

/// Log the effective configuration.
fn log_config(cli: &Cli) {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %cli.bind_address(),
        db = %cli.db_path().display(),
        log_dir = %cli.log_dir().display(),
        debug = cli.debug,
        session_ttl_secs = cli.session_ttl,
        prune_interval_secs = cli.prune_interval,
        blocklist_sources = ?cli.blocklist_sources(),
        "SugarCube configuration"
    );
    if cli.debug {
        warn!("Debug mode: API-version check disabled");
    }
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    warn!("Shutting down server...");
}

/// Boot the server and run until a shutdown signal arrives.
pub async fn run(cli: Cli) -> Result<()> {
    log_config(&cli);

    let db_path = cli.db_path();
    let store = Arc::new(
        CouponStore::open(&db_path)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?,
    );

    let sessions = Arc::new(SessionManager::new(cli.session_config()));
    sessions.start_pruner();

    let state = AppState::new(cli.server_config(), sessions.clone(), store);
    let jobs = spawn_maintenance(&state);
    info!(jobs = jobs.len(), "Maintenance jobs started");

    let result = Server::new(state)
        .run_with_shutdown(shutdown_signal())
        .await
        .context("Server failed");

    jobs.shutdown().await;
    sessions.shutdown().await;

    if result.is_ok() {
        warn!("Application exited cleanly");
    }
    result
}
