//! Configuration module for docharvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and layering `DOCHARVEST_*` environment overrides on top.
//!
//! # Example
//!
//! ```no_run
//! use docharvest::config::resolve_config;
//! use std::path::Path;
//!
//! let config = resolve_config(Some(Path::new("docharvest.toml")), |k| std::env::var(k).ok()).unwrap();
//! println!("Crawler will collect at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BackendConfig, CacheConfig, Config, ConverterConfig, CrawlerConfig, PipelineConfig,
    DEFAULT_CONCURRENCY, MAX_CONCURRENCY, MAX_MAX_PAGES,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, default_cache_root, default_docs_root, load_config, resolve_config,
};
