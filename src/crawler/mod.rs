//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic and size ceilings
//! - Surface-level link and title extraction
//! - The visited set and budget-bounded frontier
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{CrawlLimits, CrawlOutcome, Crawler};
pub use fetcher::{build_http_client, FetchPolicy, FetchResult, Fetcher};
pub use frontier::Frontier;
pub use parser::{collect_sample_paths, extract_links, extract_title, MAX_ANCHOR_MATCHES};

/// A fetched page handed to the processing pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawledPage {
    /// Absolute URL the page was requested as
    pub url: String,
    /// Raw document text
    pub html: String,
    /// Content of the first `<title>` element
    pub title: Option<String>,
}
