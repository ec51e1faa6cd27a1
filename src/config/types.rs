use serde::Deserialize;
use std::path::PathBuf;

/// Hard ceiling on pipeline workers
pub const MAX_CONCURRENCY: usize = 16;
/// Default number of pipeline workers
pub const DEFAULT_CONCURRENCY: usize = 5;
/// Hard ceiling on pages per crawl
pub const MAX_MAX_PAGES: usize = 20_000;

/// Main configuration structure for docharvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub pipeline: PipelineConfig,
    pub converter: ConverterConfig,
    pub cache: CacheConfig,
    pub backend: BackendConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of pages collected by one crawl
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Retries for 429/5xx and transient network failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base delay of the exponential backoff (milliseconds)
    #[serde(rename = "retry-base-delay-ms")]
    pub retry_base_delay_ms: u64,

    /// Upper bound honoured for a server supplied Retry-After (seconds)
    #[serde(rename = "max-retry-after-secs")]
    pub max_retry_after_secs: u64,

    /// Largest response body kept in memory (bytes)
    #[serde(rename = "max-body-bytes")]
    pub max_body_bytes: u64,

    /// Wall-clock budget for a whole crawl (seconds)
    #[serde(rename = "time-budget-secs")]
    pub time_budget_secs: u64,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: MAX_MAX_PAGES,
            request_timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            max_retry_after_secs: 60,
            max_body_bytes: 10 * 1024 * 1024,
            time_budget_secs: 30 * 60,
            user_agent: format!("docharvest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Page processing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of concurrent workers (1..=16)
    pub concurrency: usize,

    /// HTML characters sent to the converter per page
    #[serde(rename = "max-html-chars")]
    pub max_html_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_html_chars: 80_000,
        }
    }
}

/// Remote conversion model configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Base URL of an OpenAI compatible chat completions API
    pub endpoint: String,

    /// Model identifier passed to the endpoint
    pub model: String,

    /// Attempts per conversion call
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Base delay of the conversion retry backoff (milliseconds)
    #[serde(rename = "retry-base-delay-ms")]
    pub retry_base_delay_ms: u64,

    /// Per-call timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// API key; never read from the config file, only from the environment
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1".to_string(),
            model: "openai/gpt-oss-safeguard-20b".to_string(),
            max_attempts: 3,
            retry_base_delay_ms: 1000,
            timeout_secs: 120,
            api_key: None,
        }
    }
}

/// Local cache locations
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding one subdirectory per docset id
    #[serde(rename = "cache-root")]
    pub cache_root: Option<PathBuf>,

    /// User facing document root; one subdirectory per docset name
    #[serde(rename = "docs-root")]
    pub docs_root: Option<PathBuf>,
}

/// Shared remote cache configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the remote docset backend; remote sync is off when unset
    pub url: Option<String>,
}
