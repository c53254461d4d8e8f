//! Command-line arguments.
//!
//! Every flag also reads a `SUGARCUBE_*` environment variable; an explicit
//! flag wins over the environment.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use sugarcube_server::ServerConfig;
use sugarcube_server::config::DEFAULT_BLOCKLIST_SOURCE;
use sugarcube_session::SessionConfig;

/// SugarCube - coupon lookup and feedback server
#[derive(Parser, Debug)]
#[command(name = "sugarcube")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Port to listen on
    #[arg(
        short,
        long,
        env = "SUGARCUBE_PORT",
        default_value_t = 8080,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub port: u16,

    /// Address to bind to
    #[arg(long, env = "SUGARCUBE_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// SQLite database path (default: <data dir>/sugarcube/sugarcube.db)
    #[arg(long, env = "SUGARCUBE_DB")]
    pub db: Option<PathBuf>,

    /// Debug mode: skip the API-version header check
    #[arg(long, env = "SUGARCUBE_DEBUG")]
    pub debug: bool,

    /// Enable verbose output
    #[arg(short, long, env = "SUGARCUBE_VERBOSE")]
    pub verbose: bool,

    /// Directory for the rotating JSON log (default: <data dir>/sugarcube/logs)
    #[arg(long, env = "SUGARCUBE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// IP blocklist URL (can be specified multiple times)
    #[arg(
        long = "blocklist-source",
        value_name = "URL",
        env = "SUGARCUBE_BLOCKLIST_SOURCES",
        value_delimiter = ','
    )]
    pub blocklist_sources: Vec<String>,

    /// Disable the periodic blocklist refresh
    #[arg(long, env = "SUGARCUBE_NO_BLOCKLIST", conflicts_with = "blocklist_sources")]
    pub no_blocklist: bool,

    /// Session lifetime in seconds
    #[arg(
        long,
        env = "SUGARCUBE_SESSION_TTL",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub session_ttl: u64,

    /// Expired-session sweep period in seconds
    #[arg(
        long,
        env = "SUGARCUBE_PRUNE_INTERVAL",
        default_value_t = 3,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub prune_interval: u64,
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("sugarcube"))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Cli {
    /// Socket address to listen on.
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Database file location.
    pub fn db_path(&self) -> PathBuf {
        self.db
            .clone()
            .unwrap_or_else(|| data_dir().join("sugarcube.db"))
    }

    /// Log directory location.
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("logs"))
    }

    /// Blocklist sources after applying `--no-blocklist` and the default.
    pub fn blocklist_sources(&self) -> Vec<String> {
        if self.no_blocklist {
            Vec::new()
        } else if self.blocklist_sources.is_empty() {
            vec![DEFAULT_BLOCKLIST_SOURCE.to_string()]
        } else {
            self.blocklist_sources.clone()
        }
    }

    /// Server configuration derived from the arguments.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new()
            .with_bind_address(self.bind_address())
            .with_debug(self.debug)
            .with_blocklist_sources(self.blocklist_sources())
    }

    /// Session configuration derived from the arguments.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new()
            .with_ttl(Duration::from_secs(self.session_ttl))
            .with_prune_interval(Duration::from_secs(self.prune_interval))
    }
}
