//! HTTP fetching of Futpédia's pages.
//!
//! The site intermittently answers with refusal statuses even for pages
//! that exist, so the requester retries those with an exponential backoff
//! before giving up. Transport failures are reported separately from
//! status failures.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ScraperConfig;
use crate::error::{Result, ScrapediaError};

/// Statuses the site is known to answer transiently.
pub const RETRYABLE_STATUSES: [u16; 5] = [403, 404, 502, 503, 504];

/// Outcome of a single HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Port for the HTTP transport so tests can swap the network out.
pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// Transport backed by a blocking reqwest client.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| ScrapediaError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| connection_error(url, e))?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| connection_error(url, e))?;
        Ok(HttpResponse { status, body })
    }
}

fn connection_error(url: &str, source: reqwest::Error) -> ScrapediaError {
    ScrapediaError::Connection {
        url: url.to_string(),
        source: Box::new(source),
    }
}

/// Retry behavior for the statuses in [`RETRYABLE_STATUSES`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: Duration,
    pub max_backoff: Duration,
    pub retryable: Vec<u16>,
}

impl RetryPolicy {
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_factor: config.backoff_factor(),
            max_backoff: config.max_backoff(),
            retryable: RETRYABLE_STATUSES.to_vec(),
        }
    }

    fn is_retryable(&self, status: u16) -> bool {
        self.retryable.contains(&status)
    }

    /// Wait before retry `attempt` (1-based): factor * 2^(attempt - 1),
    /// capped at `max_backoff`.
    fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let wait = self.backoff_factor.saturating_mul(1u32 << exp);
        wait.min(self.max_backoff)
    }
}

/// Fetches pages below the configured base URL, retrying transient
/// refusals.
pub struct Requester {
    base_url: String,
    policy: RetryPolicy,
    transport: Arc<dyn HttpTransport>,
}

impl Requester {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Requester over an explicit transport. Tests hand in counting fakes
    /// through here.
    pub fn with_transport(config: &ScraperConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            policy: RetryPolicy::from_config(config),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the page at `path` below the base URL and returns its body.
    ///
    /// Only 2xx responses produce a body; any other final status comes back
    /// as [`ScrapediaError::Fetch`] carrying that status code. Callers that
    /// need the raw status and body together should go through
    /// [`HttpTransport`] directly.
    pub fn fetch(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0u32;

        loop {
            debug!(%url, attempt, "fetching page");
            let response = self.transport.get(&url)?;

            if (200..300).contains(&response.status) {
                return Ok(response.body);
            }

            if self.policy.is_retryable(response.status) && attempt < self.policy.max_retries {
                attempt += 1;
                let wait = self.policy.backoff(attempt);
                warn!(
                    status = response.status,
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    %url,
                    "transient status, backing off before retrying"
                );
                thread::sleep(wait);
                continue;
            }

            return Err(ScrapediaError::Fetch {
                status: response.status,
                path: path.to_string(),
            });
        }
    }
}
