//! HTTP fetching with retry and backoff
//!
//! All page and robots.txt requests go through a single reqwest client
//! carrying the configured user agent and per-request timeout. Page fetches
//! retry on any transport or non-2xx failure with a linearly increasing
//! backoff.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Terminal fetch failure, raised after every attempt for a URL failed
#[derive(Debug, Error)]
#[error("fetch failed for {url} after {attempts} attempt(s): {cause}")]
pub struct FetchError {
    /// The URL that could not be fetched
    pub url: String,

    /// How many attempts were made
    pub attempts: u32,

    /// The last failure observed before giving up
    pub cause: FetchCause,
}

/// The cause of a failed fetch attempt
#[derive(Debug, Error)]
pub enum FetchCause {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Transport(String),
}

/// Builds the HTTP client shared by the fetcher and the robots guard
pub fn build_http_client(user_agent: &str, timeout_ms: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_millis(timeout_ms))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches page bodies with bounded retries
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    base_delay: Duration,
}

impl Fetcher {
    /// Creates a fetcher
    ///
    /// # Arguments
    ///
    /// * `client` - The shared HTTP client
    /// * `max_retries` - Total number of attempts per URL (at least one is
    ///   always made)
    /// * `base_delay_ms` - Backoff unit; the wait after attempt `n` is
    ///   `n * base_delay_ms`
    pub fn new(client: Client, max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            client,
            max_retries,
            base_delay: Duration::from_millis(base_delay_ms),
        }
    }

    /// Fetches a URL and returns the response body
    ///
    /// Any transport error, timeout, or non-2xx status counts as a failed
    /// attempt. After exhausting the attempt budget the last cause is
    /// propagated in a [`FetchError`]; the caller decides whether that is
    /// fatal (a start URL) or recorded as a per-page error (a discovered
    /// URL).
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let attempts = self.max_retries.max(1);
        let mut last_cause = FetchCause::Transport("no attempt made".to_string());

        for attempt in 1..=attempts {
            match self.attempt(url).await {
                Ok(body) => return Ok(body),
                Err(cause) => {
                    tracing::warn!(
                        "Error fetching {} (attempt {}/{}): {}",
                        url,
                        attempt,
                        attempts,
                        cause
                    );
                    last_cause = cause;

                    if attempt < attempts {
                        tokio::time::sleep(self.base_delay * attempt).await;
                    }
                }
            }
        }

        Err(FetchError {
            url: url.to_string(),
            attempts,
            cause: last_cause,
        })
    }

    async fn attempt(&self, url: &str) -> Result<String, FetchCause> {
        let response = self.client.get(url).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchCause::Status(status.as_u16()));
        }

        response.text().await.map_err(classify)
    }
}

fn classify(error: reqwest::Error) -> FetchCause {
    if error.is_timeout() {
        FetchCause::Timeout
    } else {
        FetchCause::Transport(error.to_string())
    }
}
