//! Page classification and conversion pipeline
//!
//! For each crawled page:
//!
//! 1. Try the sibling `.md` URL; a usable reply is trusted as Markdown, and
//!    a reply that is only the skip marker is a final non-doc
//! 2. Otherwise ask the converter to classify and convert the page
//! 3. If the converter skips a page that looks like documentation, ask again
//!    with the "treat as doc" directive; a second skip is final
//! 4. Record the decision in the prefix statistics
//! 5. Write documentation pages through the path mapper
//!
//! Pages are processed by a bounded pool of workers. A failure on one page
//! is logged and only excludes that page.

mod classify;
mod pool;

pub use classify::{is_likely_doc, looks_like_html, markdown_url};
pub use pool::run_bounded;

use crate::config::PipelineConfig;
use crate::convert::{
    is_skip_marker, truncate_html, Conversion, ConversionRequest, ConvertError, Converter,
};
use crate::crawler::{CrawledPage, Fetcher};
use crate::output::PrefixStats;
use crate::storage::{infer_title, map_url_to_path, write_document, BackendPage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// What happened to one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Written as a document
    Written(BackendPage),
    /// Classified as not documentation
    NonDoc,
    /// Conversion or write failed
    Failed,
}

/// Summary of one pipeline run
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Pages handed to the pipeline
    pub pages_processed: usize,
    /// Documents written, in completion order
    pub written: Vec<BackendPage>,
    /// Pages classified as not documentation
    pub non_doc: usize,
    /// Pages that failed to convert or write
    pub failed: usize,
    /// Advisory prefix for future crawls
    pub suggested_prefix: Option<String>,
}

/// Bounded-concurrency page processor
#[derive(Clone)]
pub struct Pipeline {
    fetcher: Fetcher,
    converter: Arc<dyn Converter>,
    concurrency: usize,
    max_html_chars: usize,
}

impl Pipeline {
    pub fn new(fetcher: Fetcher, converter: Arc<dyn Converter>, config: &PipelineConfig) -> Self {
        Self {
            fetcher,
            converter,
            concurrency: config.concurrency.max(1),
            max_html_chars: config.max_html_chars,
        }
    }

    /// Processes all pages, writing documents under `out_root`
    pub async fn run(
        &self,
        pages: Vec<CrawledPage>,
        base_url: &Url,
        out_root: &Path,
    ) -> PipelineReport {
        let pages_processed = pages.len();
        let stats = Arc::new(PrefixStats::new());
        let this = Arc::new(self.clone());
        let base_url = base_url.clone();
        let out_root: PathBuf = out_root.to_path_buf();

        tracing::info!(
            "Processing {} pages with {} workers",
            pages_processed,
            self.concurrency
        );

        let worker_stats = Arc::clone(&stats);
        let outcomes = run_bounded(pages, self.concurrency, move |page| {
            let this = Arc::clone(&this);
            let stats = Arc::clone(&worker_stats);
            let base_url = base_url.clone();
            let out_root = out_root.clone();
            async move { this.process_page(page, &base_url, &out_root, &stats).await }
        })
        .await;

        let mut report = PipelineReport {
            pages_processed,
            ..PipelineReport::default()
        };
        for outcome in outcomes {
            match outcome {
                PageOutcome::Written(page) => report.written.push(page),
                PageOutcome::NonDoc => report.non_doc += 1,
                PageOutcome::Failed => report.failed += 1,
            }
        }
        report.suggested_prefix = stats.suggest();

        tracing::info!(
            "Pipeline finished: {} written, {} non-doc, {} failed",
            report.written.len(),
            report.non_doc,
            report.failed
        );
        report
    }

    /// Runs one page through the classification protocol
    pub async fn process_page(
        &self,
        page: CrawledPage,
        base_url: &Url,
        out_root: &Path,
        stats: &PrefixStats,
    ) -> PageOutcome {
        let page_url = match Url::parse(&page.url) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!("Skipping unparsable page URL {}: {}", page.url, e);
                return PageOutcome::Failed;
            }
        };

        let conversion = match self.fetch_direct_markdown(&page.url).await {
            Some(markdown) if is_skip_marker(&markdown) => {
                tracing::debug!("Published Markdown for {} is a skip marker", page.url);
                Conversion::NonDoc
            }
            Some(markdown) => {
                tracing::debug!("Using published Markdown for {}", page.url);
                Conversion::Doc(markdown)
            }
            None => match self.classify(&page).await {
                Ok(conversion) => conversion,
                Err(e) => {
                    tracing::warn!("Conversion failed for {}: {}", page.url, e);
                    return PageOutcome::Failed;
                }
            },
        };

        stats.record(&page_url, conversion.is_doc());

        let markdown = match conversion {
            Conversion::Doc(markdown) => markdown,
            Conversion::NonDoc => {
                tracing::debug!("Skipping non-doc page {}", page.url);
                return PageOutcome::NonDoc;
            }
        };

        let mapped = map_url_to_path(base_url, &page_url);
        match write_document(out_root, &mapped, &markdown).await {
            Ok(path) => {
                tracing::debug!("Wrote {} -> {}", page.url, path.display());
                let title = page.title.clone().or_else(|| infer_title(&markdown));
                PageOutcome::Written(BackendPage {
                    url: page.url,
                    title,
                    content_markdown: markdown,
                })
            }
            Err(e) => {
                tracing::warn!("Failed to write {}: {}", page.url, e);
                PageOutcome::Failed
            }
        }
    }

    /// Asks the converter, retrying forced when a skip looks wrong
    async fn classify(&self, page: &CrawledPage) -> Result<Conversion, ConvertError> {
        let request = ConversionRequest {
            url: &page.url,
            title: page.title.as_deref(),
            html: truncate_html(&page.html, self.max_html_chars),
            force_doc: false,
        };

        match self.converter.convert(&request).await? {
            Conversion::NonDoc if is_likely_doc(&page.url, page.title.as_deref(), &page.html) => {
                tracing::debug!("Skip overridden for likely doc page {}", page.url);
                let forced = ConversionRequest {
                    force_doc: true,
                    ..request
                };
                self.converter.convert(&forced).await
            }
            other => Ok(other),
        }
    }

    /// Fetches the page's sibling `.md`, if the site publishes one
    async fn fetch_direct_markdown(&self, page_url: &str) -> Option<String> {
        let md_url = markdown_url(page_url)?;
        let body = self.fetcher.fetch_text(&md_url).await?;
        if body.trim().is_empty() || looks_like_html(&body) {
            return None;
        }
        Some(body)
    }
}
