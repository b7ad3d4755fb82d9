use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_key: String,
    pub fetch_limit: u64,

    pub poll_interval_ms: u64,
    pub retry_count: u64,
    pub retry_delay_ms: u64,
    pub http_timeout_secs: u64,

    pub status_log_interval_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let api_base_url = env_string("POLLER_API_BASE_URL", None)?;
        let url = Url::parse(&api_base_url).context("invalid POLLER_API_BASE_URL")?;
        if url.host_str().is_none() {
            return Err(anyhow!("POLLER_API_BASE_URL missing host"));
        }
        let api_base_url = api_base_url.trim_end_matches('/').to_string();

        let api_key = env_string("POLLER_API_KEY", None)?;
        if api_key.is_empty() {
            return Err(anyhow!("POLLER_API_KEY must not be empty"));
        }

        let fetch_limit = env_u64("POLLER_FETCH_LIMIT", Some(100))?;
        let poll_interval_ms = env_u64("POLLER_POLL_INTERVAL_MS", Some(2000))?;
        // Retries after the initial request, matching the upstream dashboard's
        // fetch policy (retry: 3, retryDelay: 5000).
        let retry_count = env_u64("POLLER_RETRY_COUNT", Some(3))?;
        let retry_delay_ms = env_u64("POLLER_RETRY_DELAY_MS", Some(5000))?;
        let http_timeout_secs = env_u64("POLLER_HTTP_TIMEOUT_SECS", Some(10))?;
        let status_log_interval_ms = env_u64("POLLER_STATUS_LOG_INTERVAL_MS", Some(30_000))?;

        Ok(Self {
            api_base_url,
            api_key,
            fetch_limit,
            poll_interval_ms,
            retry_count,
            retry_delay_ms,
            http_timeout_secs,
            status_log_interval_ms,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn status_log_interval(&self) -> Duration {
        Duration::from_millis(self.status_log_interval_ms)
    }
}

fn env_string(key: &str, default: Option<String>) -> Result<String> {
    match env::var(key) {
        Ok(value) => Ok(value.trim().to_string()),
        Err(_) => default.ok_or_else(|| anyhow!("missing env var {key}")),
    }
}

fn env_u64(key: &str, default: Option<u64>) -> Result<u64> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .with_context(|| format!("invalid {key}")),
        Err(_) => default.ok_or_else(|| anyhow!("missing env var {key}")),
    }
}
