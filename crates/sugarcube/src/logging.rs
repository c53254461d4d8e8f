//! Tracing setup: human-readable console output plus a daily-rotated JSON
//! log file.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const CONSOLE_FILTER: &str = "sugarcube=info,sugarcube_server=info,sugarcube_session=info,sugarcube_store=info,warn";
const CONSOLE_FILTER_VERBOSE: &str = "sugarcube=debug,sugarcube_server=debug,sugarcube_session=debug,sugarcube_store=debug,tower_http=debug,info";
const FILE_FILTER: &str = "sugarcube=trace,sugarcube_server=trace,sugarcube_session=trace,sugarcube_store=trace,info";

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init(verbose: bool, log_dir: &Path) -> Result<WorkerGuard> {
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("sugarcube")
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_filter = if verbose {
        CONSOLE_FILTER_VERBOSE
    } else {
        CONSOLE_FILTER
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(EnvFilter::new(console_filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new(FILE_FILTER)),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
