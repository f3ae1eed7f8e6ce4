//! HTTP page fetching with exponential backoff retry.
//!
//! # Architecture
//!
//! - [`FetchPage`]: core trait, "give me the markup behind this URL"
//! - [`HttpFetcher`]: `reqwest`-backed implementation with a fixed timeout
//! - [`RetryFetch`]: decorator that retries any [`FetchPage`] according to a
//!   [`RetryPolicy`]
//!
//! # Retry Strategy
//!
//! - At most 3 retries after the initial attempt
//! - Only HTTP 500, 502, 504 and connection failures are retried
//! - Delay is `backoff_factor * 2^(retry - 1)`: 0.3s, 0.6s, 1.2s by default

use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Overall timeout applied to every single request attempt.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Retries performed after the initial attempt.
pub const MAX_RETRIES: u32 = 3;
/// Base of the exponential backoff, in seconds.
pub const BACKOFF_FACTOR: f64 = 0.3;
/// Upper bound on a single backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);
/// Status codes treated as transient.
pub const RETRY_STATUSES: [u16; 3] = [500, 502, 504];

const USER_AGENT: &str = concat!("cnn_sitemap_news/", env!("CARGO_PKG_VERSION"));

/// Why a page could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("server responded with HTTP {0}")]
    Status(u16),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

impl FetchError {
    /// Whether the failure is worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Status(code) => RETRY_STATUSES.contains(code),
            FetchError::Connect(_) => true,
            FetchError::Timeout | FetchError::Request(_) => false,
        }
    }
}

/// Trait for fetching the raw markup of a page.
///
/// Implemented by the real HTTP client and by the [`RetryFetch`] decorator;
/// tests substitute in-memory implementations.
pub trait FetchPage {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Outcome of consulting a [`RetryPolicy`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetryDecision {
    /// Sleep for the given delay, then try again.
    Retry(Duration),
    /// Stop and surface the error.
    GiveUp,
}

/// Pure retry policy: `(retries already done, error) -> decision`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            backoff_factor: BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    pub fn decide(&self, retries_done: u32, err: &FetchError) -> RetryDecision {
        if retries_done >= self.max_retries || !err.is_transient() {
            return RetryDecision::GiveUp;
        }
        let exp = i32::try_from(retries_done).unwrap_or(i32::MAX);
        let secs = self.backoff_factor * 2f64.powi(exp);
        let delay = Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(MAX_BACKOFF);
        RetryDecision::Retry(delay.min(MAX_BACKOFF))
    }
}

/// `reqwest`-backed fetcher. Non-2xx responses are errors.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl FetchPage for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let res = self.client.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(res.text().await?)
    }
}

/// Decorator adding [`RetryPolicy`]-driven retries to any [`FetchPage`].
pub struct RetryFetch<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryFetch<T>
where
    T: FetchPage,
{
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.policy.max_retries)
            .field("backoff_factor", &self.policy.backoff_factor)
            .finish()
    }
}

impl<T> FetchPage for RetryFetch<T>
where
    T: FetchPage,
{
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut retries = 0u32;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.fetch(url).await {
                Ok(body) => {
                    debug!(
                        retries,
                        bytes = body.len(),
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        "fetch succeeded"
                    );
                    return Ok(body);
                }
                Err(e) => match self.policy.decide(retries, &e) {
                    RetryDecision::Retry(delay) => {
                        retries += 1;
                        warn!(
                            retry = retries,
                            max = self.policy.max_retries,
                            elapsed_ms_attempt = attempt_t0.elapsed().as_millis(),
                            ?delay,
                            error = %e,
                            "fetch attempt failed; backing off"
                        );
                        sleep(delay).await;
                    }
                    RetryDecision::GiveUp => {
                        error!(
                            retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis(),
                            error = %e,
                            "fetch failed"
                        );
                        return Err(e);
                    }
                },
            }
        }
    }
}

/// Build the production fetcher: HTTP client wrapped in retry logic.
pub fn http_fetcher(
    timeout: Duration,
    policy: RetryPolicy,
) -> Result<RetryFetch<HttpFetcher>, reqwest::Error> {
    Ok(RetryFetch::new(HttpFetcher::new(timeout)?, policy))
}
