//! Crawler coordinator - main crawl orchestration logic
//!
//! The crawl loop is strictly sequential: one URL is dequeued, fetched,
//! scanned for links and recorded before the next one starts. Only the
//! page processing that follows a crawl runs concurrently.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::{extract_links, extract_title};
use crate::crawler::CrawledPage;
use std::time::{Duration, Instant};
use url::Url;

/// Global safety bounds for one crawl
#[derive(Debug, Clone, Copy)]
pub struct CrawlLimits {
    /// Maximum number of pages collected
    pub max_pages: usize,
    /// Wall-clock budget for the whole crawl
    pub time_budget: Duration,
}

impl CrawlLimits {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            time_budget: Duration::from_secs(config.time_budget_secs),
        }
    }
}

/// Pages collected by one crawl
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Successfully fetched pages in discovery order
    pub pages: Vec<CrawledPage>,
    /// URLs that were dequeued but could not be fetched
    pub failed: usize,
    /// Whether the wall-clock budget cut the crawl short
    pub timed_out: bool,
}

/// Breadth-first, same-origin crawler
#[derive(Debug, Clone)]
pub struct Crawler {
    fetcher: Fetcher,
    limits: CrawlLimits,
}

impl Crawler {
    pub fn new(fetcher: Fetcher, limits: CrawlLimits) -> Self {
        Self { fetcher, limits }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Crawls from `base_url`, following links under `path_prefix`
    ///
    /// Never returns more than `max_pages` pages. Fetch failures drop the
    /// URL and the crawl continues. Running out of wall-clock budget ends
    /// the crawl with the pages gathered so far.
    pub async fn crawl(&self, base_url: &Url, path_prefix: Option<&str>) -> CrawlOutcome {
        let deadline = Instant::now() + self.limits.time_budget;
        let mut frontier = Frontier::new(base_url.as_str(), self.limits.max_pages);
        let mut outcome = CrawlOutcome::default();

        tracing::info!(
            "Crawling {} (prefix: {}, max pages: {})",
            base_url,
            path_prefix.unwrap_or("none"),
            self.limits.max_pages
        );

        while outcome.pages.len() < self.limits.max_pages {
            let Some(url) = frontier.next_url() else {
                tracing::debug!("Frontier is empty, crawl complete");
                break;
            };

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                outcome.timed_out = true;
                break;
            }

            tracing::debug!("Fetching {}", url);
            let result = match tokio::time::timeout(remaining, self.fetcher.fetch(&url)).await {
                Ok(result) => result,
                Err(_) => {
                    outcome.timed_out = true;
                    break;
                }
            };

            let (final_url, body) = match result {
                FetchResult::Success {
                    final_url, body, ..
                } => (final_url, body),
                other => {
                    tracing::warn!("Skipping {}: {}", url, other.describe());
                    outcome.failed += 1;
                    continue;
                }
            };

            // Relative links resolve against where redirects ended up
            let Ok(page_url) = Url::parse(&final_url).or_else(|_| Url::parse(&url)) else {
                outcome.failed += 1;
                continue;
            };

            let links = extract_links(&page_url, &body, base_url, path_prefix);
            let title = extract_title(&body);
            outcome.pages.push(CrawledPage {
                url,
                html: body,
                title,
            });

            let collected = outcome.pages.len();
            for link in links {
                frontier.admit(link, collected);
            }

            if collected % 25 == 0 {
                tracing::info!(
                    "Progress: {} pages crawled, {} queued",
                    collected,
                    frontier.queued_len()
                );
            }
        }

        if outcome.timed_out {
            tracing::warn!(
                "Crawl time budget of {:?} exhausted; keeping {} pages",
                self.limits.time_budget,
                outcome.pages.len()
            );
        }

        tracing::info!(
            "Crawl finished: {} pages, {} failed",
            outcome.pages.len(),
            outcome.failed
        );

        outcome
    }
}
