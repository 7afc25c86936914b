use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_api_key: String,
    pub store_base_id: String,
    pub completion_api_key: String,
    /// FX rate API endpoint; defaults to the public exchangerate host.
    pub fx_api_url: String,
    /// Maximum concurrent FX lookups during shortlisting.
    pub shortlist_concurrency: usize,
    /// Enrichment score strictly above this value maps to "Yes".
    pub score_threshold: i64,
    /// Hard ceiling for a whole pipeline run.
    pub pipeline_deadline: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            store_api_key: require_env("STORE_API_KEY")?,
            store_base_id: require_env("STORE_BASE_ID")?,
            completion_api_key: require_env("COMPLETION_API_KEY")?,
            fx_api_url: std::env::var("FX_API_URL")
                .unwrap_or_else(|_| "https://api.exchangerate.host/convert".to_string()),
            shortlist_concurrency: parse_env("SHORTLIST_CONCURRENCY", 8)?,
            score_threshold: parse_env("SCORE_THRESHOLD", 1)?,
            pipeline_deadline: Duration::from_secs(parse_env("PIPELINE_DEADLINE_SECS", 600)?),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' is not a valid value")),
        Err(_) => Ok(default),
    }
}
