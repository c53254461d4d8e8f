//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use sugarcube_server::{AppState, Server, ServerConfig};
use sugarcube_session::{ManualClock, SessionConfig, SessionManager};
use sugarcube_store::CouponStore;

/// Header value every API request carries.
pub const API_VERSION: &str = "v1";

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client configured for this server.
    pub client: Client,
    /// Shared state, for inspecting sessions and the store.
    pub state: AppState,
    /// Clock driving session expiry.
    pub clock: Arc<ManualClock>,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
    /// Temporary directory holding the database.
    pub temp_dir: TempDir,
}

impl TestServer {
    /// Start a new test server with default configuration.
    pub async fn start() -> Result<Self> {
        Self::start_with_config(ServerConfig::new()).await
    }

    /// Start a new test server with a custom configuration.
    ///
    /// Background jobs are not started; the blocklist never touches the
    /// network.
    pub async fn start_with_config(config: ServerConfig) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let store = Arc::new(CouponStore::open(temp_dir.path().join("sugarcube.db"))?);

        let clock = Arc::new(ManualClock::default());
        let sessions = Arc::new(SessionManager::with_clock(
            SessionConfig::default(),
            clock.clone(),
        ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let config = config
            .with_bind_address(addr)
            .with_blocklist_sources(Vec::new())
            .with_request_logging(false);
        let state = AppState::new(config, sessions, store);

        let shutdown = CancellationToken::new();
        let server = Server::new(state.clone());
        let signal = shutdown.clone();
        let handle = tokio::spawn(async move {
            let _ = server
                .serve(listener, async move { signal.cancelled().await })
                .await;
        });

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            state,
            clock,
            shutdown,
            handle,
            temp_dir,
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// GET request builder carrying the API version header.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url(), path))
            .header("SC-Api-version", API_VERSION)
    }

    /// POST request builder carrying the API version header.
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url(), path))
            .header("SC-Api-version", API_VERSION)
    }

    /// Check if server is healthy.
    pub async fn health(&self) -> Result<bool> {
        let resp = self
            .client
            .get(format!("{}/health", self.base_url()))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    /// Stop the server and wait for it to exit.
    pub async fn stop(self) -> Result<()> {
        self.shutdown.cancel();
        timeout(Duration::from_secs(5), self.handle).await??;
        Ok(())
    }
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return,
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
