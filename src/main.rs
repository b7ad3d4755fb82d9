mod config;
mod livestock;
mod poller;
mod readings;
mod store;

use crate::config::Config;
use crate::poller::SensorApiClient;
use crate::store::SensorStore;
use anyhow::Result;
use std::sync::atomic::Ordering;
use tokio::time::MissedTickBehavior;

fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,sensor_poller=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing()?;

    let store = SensorStore::new();
    let client = SensorApiClient::new(&config)?;
    tracing::info!(
        endpoint = client.endpoint(),
        interval_ms = config.poll_interval_ms,
        retries = config.retry_count,
        "sensor poller starting"
    );

    let herd = livestock::herd();
    tracing::info!(
        herd = herd.len(),
        strays = livestock::strays(&herd).len(),
        "tracking mock herd"
    );

    let poll_handle = poller::spawn_poller(client, store.clone(), config.poll_interval());

    let status_store = store.clone();
    let status_interval = config.status_log_interval();
    let status_handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(status_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let stats = status_store.stats();
            let poll_stats = status_store.poll_stats();
            match status_store.last_error() {
                Some(err) => tracing::warn!(
                    avg_water_level = stats.avg_water_level,
                    polls_failed = poll_stats.polls_failed.load(Ordering::Relaxed),
                    error = %err,
                    "sensor feed degraded; serving last known readings"
                ),
                None => tracing::info!(
                    avg_water_level = stats.avg_water_level,
                    greenhouse_temperature = stats.greenhouse_temperature,
                    greenhouse_humidity = stats.greenhouse_humidity,
                    polls_ok = poll_stats.polls_ok.load(Ordering::Relaxed),
                    "sensor status"
                ),
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    // Stops the schedule; an in-flight request is dropped, not awaited.
    poll_handle.abort();
    status_handle.abort();

    Ok(())
}
