//! IP blocklist refresh.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use sugarcube_store::CouponStore;
use tracing::{error, info, warn};

/// Per-source fetch timeout.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Extract addresses from a plain-text blocklist.
///
/// One address per line; blank lines and `#` comments are skipped, as are
/// lines that do not parse as an IP address (CIDR ranges included).
pub fn parse_blocklist(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.parse::<IpAddr>().ok())
        .map(|ip| ip.to_string())
        .collect()
}

async fn fetch(client: &reqwest::Client, url: &str) -> reqwest::Result<String> {
    client
        .get(url)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}

/// Fetch every source and add its addresses to the ban list.
///
/// A failing source is logged and skipped. Returns the number of newly
/// banned addresses.
pub async fn refresh_blocklist(
    client: &reqwest::Client,
    store: Arc<CouponStore>,
    sources: &[String],
) -> usize {
    info!(sources = sources.len(), "Updating IP blocklist");
    let mut total = 0;

    for url in sources {
        let body = match fetch(client, url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(source = %url, error = %e, "Failed to fetch blocklist");
                continue;
            }
        };

        let ips = parse_blocklist(&body);
        let parsed = ips.len();
        let store = store.clone();

        match tokio::task::spawn_blocking(move || store.insert_bans(ips)).await {
            Ok(Ok(inserted)) => {
                info!(source = %url, parsed, inserted, "Blocklist source applied");
                total += inserted;
            }
            Ok(Err(e)) => error!(source = %url, error = %e, "Failed to store blocklist"),
            Err(e) => error!(source = %url, error = %e, "Blocklist insert task failed"),
        }
    }

    total
}
