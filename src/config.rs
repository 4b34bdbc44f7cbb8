use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, ScrapediaError};

/// The one site this library scrapes.
pub const BASE_URL: &str = "http://futpedia.globo.com";

const DEFAULT_USER_AGENT: &str = concat!("scrapedia/", env!("CARGO_PKG_VERSION"));

/// Knobs for the requester and the cache. Every field has a default, so a
/// config file only needs the values it wants to override.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_factor_ms: u64,
    pub max_backoff_ms: u64,
    pub cache_capacity: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            max_retries: 10,
            backoff_factor_ms: 1_000,
            max_backoff_ms: 120_000,
            cache_capacity: 10,
        }
    }
}

impl ScraperConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ScrapediaError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: ScraperConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_factor(&self) -> Duration {
        Duration::from_millis(self.backoff_factor_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}
