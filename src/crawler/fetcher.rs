//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - Retry logic for 429/5xx responses and transient network failures
//! - `Retry-After` handling with a configurable ceiling
//! - Response size ceilings, checked before and while reading the body
//! - Error classification

use crate::config::CrawlerConfig;
use crate::url::is_http_scheme;
use chrono::{DateTime, Utc};
use reqwest::{header, redirect::Policy, Client, Response, StatusCode};
use std::time::Duration;
use url::Url;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// Page body content
        body: String,
    },

    /// Final response had a non-2xx status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Response exceeded the body size ceiling
    TooLarge {
        /// Declared or observed size in bytes
        size: u64,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },

    /// The URL could not be fetched at all (parse failure, non-http scheme)
    InvalidUrl {
        /// Why the URL was rejected
        reason: String,
    },
}

impl FetchResult {
    /// Returns the body of a successful fetch
    pub fn into_body(self) -> Option<String> {
        match self {
            FetchResult::Success { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Short description of a failed fetch, for logs
    pub fn describe(&self) -> String {
        match self {
            FetchResult::Success { .. } => "ok".to_string(),
            FetchResult::HttpError { status_code } => format!("HTTP {}", status_code),
            FetchResult::TooLarge { size } => format!("response too large ({} bytes)", size),
            FetchResult::NetworkError { error } => error.clone(),
            FetchResult::InvalidUrl { reason } => format!("invalid url: {}", reason),
        }
    }
}

/// Retry and size limits applied to every request
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base delay of the exponential backoff
    pub retry_base_delay: Duration,
    /// Largest `Retry-After` honoured
    pub max_retry_after: Duration,
    /// Largest body kept in memory
    pub max_body_bytes: u64,
}

impl FetchPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_retry_after: Duration::from_secs(config.max_retry_after_secs),
            max_body_bytes: config.max_body_bytes,
        }
    }

    /// Delay before retry number `attempt` (0-based)
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.retry_base_delay.saturating_mul(factor)
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed by the client (at most 10 hops). Plain http
/// origins are allowed.
///
/// # Example
///
/// ```no_run
/// use docharvest::config::CrawlerConfig;
/// use docharvest::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP fetch primitive shared by the crawler and the `.md` shortcut
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: FetchPolicy,
}

impl Fetcher {
    pub fn new(client: Client, policy: FetchPolicy) -> Self {
        Self { client, policy }
    }

    /// Builds a fetcher with its own client from crawler settings
    pub fn from_config(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(config)?,
            FetchPolicy::from_config(config),
        ))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetches a URL with full error handling and retry logic
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Read body (size capped) |
    /// | HTTP 429, 5xx | Retry; wait `Retry-After` if present, else backoff |
    /// | Timeout, connect error | Retry with backoff |
    /// | Other 4xx | Immediate → HttpError |
    /// | Body over the ceiling | Immediate → TooLarge, never retried |
    /// | Non-http(s) scheme | Immediate → InvalidUrl, no request made |
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let parsed = match Url::parse(url) {
            Ok(u) if is_http_scheme(&u) => u,
            Ok(u) => {
                return FetchResult::InvalidUrl {
                    reason: format!("unsupported scheme '{}'", u.scheme()),
                }
            }
            Err(e) => {
                return FetchResult::InvalidUrl {
                    reason: e.to_string(),
                }
            }
        };

        let mut attempt = 0;
        loop {
            match self.client.get(parsed.clone()).send().await {
                Ok(response) => {
                    let status = response.status();

                    if is_retryable_status(status) && attempt < self.policy.max_retries {
                        let delay = retry_after(response.headers(), self.policy.max_retry_after)
                            .unwrap_or_else(|| self.policy.backoff(attempt));
                        tracing::debug!(
                            "HTTP {} for {}, retrying in {:?} (attempt {}/{})",
                            status.as_u16(),
                            url,
                            delay,
                            attempt + 1,
                            self.policy.max_retries
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    if !status.is_success() {
                        return FetchResult::HttpError {
                            status_code: status.as_u16(),
                        };
                    }

                    return self.read_body(response).await;
                }
                Err(e) => {
                    if is_transient(&e) && attempt < self.policy.max_retries {
                        let delay = self.policy.backoff(attempt);
                        tracing::debug!("{} for {}, retrying in {:?}", classify(&e), url, delay);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    return FetchResult::NetworkError { error: classify(&e) };
                }
            }
        }
    }

    /// Fetches a URL and returns its body only on success
    pub async fn fetch_text(&self, url: &str) -> Option<String> {
        let result = self.fetch(url).await;
        if !matches!(result, FetchResult::Success { .. }) {
            tracing::debug!("Fetch of {} failed: {}", url, result.describe());
        }
        result.into_body()
    }

    /// Reads a response body without holding more than the ceiling in memory
    async fn read_body(&self, mut response: Response) -> FetchResult {
        let final_url = response.url().to_string();

        let limit = self.policy.max_body_bytes;
        if let Some(declared) = response.content_length() {
            if declared > limit {
                return FetchResult::TooLarge { size: declared };
            }
        }

        let mut buf: Vec<u8> = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let size = (buf.len() + chunk.len()) as u64;
                    if size > limit {
                        return FetchResult::TooLarge { size };
                    }
                    buf.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => return FetchResult::NetworkError { error: classify(&e) },
            }
        }

        FetchResult::Success {
            final_url,
            body: String::from_utf8_lossy(&buf).into_owned(),
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect()
}

fn classify(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else if e.is_redirect() {
        "Too many redirects".to_string()
    } else {
        e.to_string()
    }
}

/// Parses `Retry-After` as delta-seconds or an HTTP-date, capped at `max`
fn retry_after(headers: &header::HeaderMap, max: Duration) -> Option<Duration> {
    let raw = headers.get(header::RETRY_AFTER)?.to_str().ok()?.trim();
    parse_retry_after(raw, Utc::now()).map(|d| d.min(max))
}

fn parse_retry_after(raw: &str, now: DateTime<Utc>) -> Option<Duration> {
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}
