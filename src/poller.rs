use crate::config::Config;
use crate::readings::SensorEnvelope;
use crate::store::SensorStore;
use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, MissedTickBehavior};
use tracing::{debug, warn};

/// HTTP client for the remote sensor API.
pub struct SensorApiClient {
    http: Client,
    endpoint: String,
    api_key: String,
    retry_count: u64,
    retry_delay: Duration,
}

impl SensorApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            endpoint: format!(
                "{}/api/sensor-data?limit={}",
                config.api_base_url.trim_end_matches('/'),
                config.fetch_limit
            ),
            api_key: config.api_key.clone(),
            retry_count: config.retry_count,
            retry_delay: config.retry_delay(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_envelope(&self) -> Result<SensorEnvelope> {
        let envelope = self
            .http
            .get(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("failed to decode sensor-data response")?;
        Ok(envelope)
    }

    /// One poll cycle: the initial request plus up to `retry_count` retries
    /// with a fixed delay between attempts.
    pub async fn poll_once(&self) -> Result<SensorEnvelope> {
        let max_attempts = (self.retry_count as usize).saturating_add(1);
        let mut attempt = 0usize;
        let mut last_err = None;
        while attempt < max_attempts {
            if attempt > 0 {
                sleep(self.retry_delay).await;
            }
            attempt += 1;
            match self.fetch_envelope().await {
                Ok(envelope) => return Ok(envelope),
                Err(err) => {
                    warn!(attempt, max_attempts, error = %format!("{err:#}"), "sensor-data fetch attempt failed");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("sensor-data fetch failed")))
    }
}

async fn poll_cycle(client: &SensorApiClient, store: &SensorStore) {
    let stats = store.poll_stats();
    stats.set_in_flight(true);
    match client.poll_once().await {
        Ok(envelope) => {
            stats.record_success();
            match envelope.into_readings() {
                Some(readings) => {
                    debug!(count = readings.len(), "replacing sensor readings");
                    store.replace(readings);
                }
                None => {
                    // Not an error: the API answered but without a usable
                    // success payload. Keep the prior collection.
                    debug!("sensor-data poll had no usable payload; keeping prior readings");
                }
            }
        }
        Err(err) => {
            let detail = format!("{err:#}");
            warn!(error = %detail, "sensor-data poll failed after retries");
            stats.record_error(detail);
        }
    }
    stats.set_in_flight(false);
}

/// Fixed-period poll loop. The first tick fires immediately; ticks that land
/// while a cycle (including its retries) is still running are skipped, so at
/// most one request is in flight at a time.
pub async fn run(client: SensorApiClient, store: SensorStore, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        poll_cycle(&client, &store).await;
    }
}

pub fn spawn_poller(client: SensorApiClient, store: SensorStore, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move { run(client, store, interval).await })
}
