//! docharvest: documentation harvester
//!
//! This crate crawls a documentation site breadth-first, converts each page to
//! Markdown through a pluggable converter, and keeps the result in a
//! content-addressed local cache that can be reconciled with a shared remote
//! backend.

pub mod config;
pub mod convert;
pub mod crawler;
pub mod output;
pub mod pipeline;
pub mod storage;
pub mod sync;
pub mod url;

use thiserror::Error;

/// Main error type for docharvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Backend error: {0}")]
    Backend(#[from] sync::BackendError),

    #[error("Conversion error: {0}")]
    Convert(#[from] convert::ConvertError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Docset not found: {0}")]
    NotFound(String),

    #[error("Ambiguous docset name '{name}', candidates: {candidates}")]
    Ambiguous { name: String, candidates: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Invalid path prefix: {0}")]
    InvalidPrefix(String),
}

/// Result type alias for docharvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawledPage, Crawler};
pub use pipeline::Pipeline;
pub use storage::{compute_doc_id, CacheMetadata};
pub use sync::DocsetManager;
pub use url::{normalize_path_prefix, parse_base_url, sanitize_name};
