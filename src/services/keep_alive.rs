use anyhow::{bail, Context, Result};
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const PING_TIMEOUT: Duration = Duration::from_secs(10);

pub fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(PING_TIMEOUT)
        .no_proxy()
        .build()
        .context("Failed to create keep-alive HTTP client")
}

/// Ping every URL once per `interval` so the host does not idle the process
pub async fn run(
    client: Client,
    urls: Vec<String>,
    interval: Duration,
    shutdown: CancellationToken,
) -> Result<()> {
    if interval.is_zero() {
        bail!("Keep-alive interval must be non-zero");
    }

    info!("Keep-alive started, pinging {} URLs every {:?}", urls.len(), interval);
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Ok(()),
            _ = ticker.tick() => {}
        }
        ping_all(&client, &urls).await;
    }
}

/// Returns how many URLs answered with a success status
pub async fn ping_all(client: &Client, urls: &[String]) -> usize {
    let mut reachable = 0;

    for url in urls {
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(url = %url, status = %response.status(), "Keep-alive ping ok");
                reachable += 1;
            }
            Ok(response) => {
                error!(url = %url, status = %response.status(), "Keep-alive ping rejected");
            }
            Err(e) => error!(url = %url, error = %e, "Keep-alive ping failed"),
        }
    }

    reachable
}
