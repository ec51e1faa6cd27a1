//! Docset orchestration over the local cache, the crawler and the backend

use crate::config::{default_cache_root, default_docs_root, Config, PipelineConfig};
use crate::convert::{ConvertError, Converter};
use crate::crawler::{collect_sample_paths, CrawlLimits, Crawler, Fetcher};
use crate::pipeline::Pipeline;
use crate::storage::{
    compute_doc_id, map_url_to_path, write_document, CacheMetadata, LocalCache, StorageError,
};
use crate::sync::{RemoteBackend, RemoteDocset};
use crate::url::{
    is_doc_id, normalize_path_prefix, parse_base_url, sanitize_name, validate_doc_name,
    validate_inferred_prefix,
};
use crate::{HarvestError, Result};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Distinct pathnames sampled for prefix inference
pub const PREFIX_SAMPLE_SIZE: usize = 40;

/// Parameters of one `index` invocation
#[derive(Debug, Clone, Default)]
pub struct IndexRequest {
    /// Raw docset name; sanitized before use
    pub name: String,
    /// Base URL of the site
    pub url: String,
    /// Optional explicit path prefix
    pub path_prefix: Option<String>,
    /// Skip both cache tiers and crawl again
    pub force: bool,
}

/// Counters of a crawl-and-convert run
#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    pub doc_id: String,
    pub doc_name: String,
    /// Prefix the crawl actually used (explicit or inferred)
    pub path_prefix: Option<String>,
    pub pages_discovered: usize,
    pub fetch_failures: usize,
    pub timed_out: bool,
    pub docs_written: usize,
    pub non_doc: usize,
    pub failed_pages: usize,
    pub suggested_prefix: Option<String>,
    pub uploaded: bool,
}

/// How an `index` request was satisfied
#[derive(Debug)]
pub enum IndexOutcome {
    /// Installed from an existing local cache entry
    CacheHit {
        metadata: CacheMetadata,
        installed: PathBuf,
    },
    /// Downloaded from the shared backend
    RemoteServed {
        metadata: CacheMetadata,
        installed: PathBuf,
    },
    /// Crawled, converted, cached and installed
    Indexed {
        metadata: CacheMetadata,
        installed: PathBuf,
        report: IndexReport,
    },
    /// The crawl found no pages or no page was written; nothing was cached
    Empty { report: IndexReport },
}

impl IndexOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, IndexOutcome::Empty { .. })
    }
}

/// Where a pulled docset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullSource {
    Local,
    Remote,
}

/// Result of a `pull`
#[derive(Debug)]
pub struct PullOutcome {
    pub metadata: CacheMetadata,
    pub installed: PathBuf,
    pub files: usize,
    pub source: PullSource,
}

/// Result of a `push`
#[derive(Debug, Default)]
pub struct PushReport {
    /// Names of the docsets uploaded
    pub pushed: Vec<String>,
    /// Entries without Markdown files
    pub skipped: usize,
    /// Uploads the backend rejected
    pub failed: usize,
}

/// Cache & sync manager
pub struct DocsetManager {
    cache: LocalCache,
    crawler: Crawler,
    converter: Option<Arc<dyn Converter>>,
    backend: Option<RemoteBackend>,
    pipeline_config: PipelineConfig,
    model: String,
}

impl DocsetManager {
    /// Builds a manager from configuration
    ///
    /// `converter` is only needed by `index` runs that have to crawl.
    pub fn new(config: &Config, converter: Option<Arc<dyn Converter>>) -> Result<Self> {
        let fetcher = Fetcher::from_config(&config.crawler)?;
        let backend = config
            .backend
            .url
            .as_deref()
            .map(|url| RemoteBackend::new(url, fetcher.client().clone()))
            .transpose()?;

        let cache = LocalCache::new(
            config
                .cache
                .cache_root
                .clone()
                .unwrap_or_else(default_cache_root),
            config
                .cache
                .docs_root
                .clone()
                .unwrap_or_else(default_docs_root),
        );

        Ok(Self {
            cache,
            crawler: Crawler::new(fetcher, CrawlLimits::from_config(&config.crawler)),
            converter,
            backend,
            pipeline_config: config.pipeline.clone(),
            model: config.converter.model.clone(),
        })
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Indexes a site, serving from the cheapest available tier
    ///
    /// Order: local cache entry, remote backend, fresh crawl. `force` skips
    /// both cache tiers. Input is validated before any network activity.
    pub async fn index(&self, request: &IndexRequest) -> Result<IndexOutcome> {
        let doc_name = validate_doc_name(&request.name)?;
        let base_url = parse_base_url(&request.url)?;
        let explicit_prefix = normalize_path_prefix(request.path_prefix.as_deref())?;
        let doc_id = compute_doc_id(&doc_name, base_url.as_str(), explicit_prefix.as_deref());

        tracing::debug!("Docset {} has id {}", doc_name, doc_id);

        if !request.force {
            if let Some(outcome) = self.serve_from_cache(&doc_id, &doc_name) {
                return Ok(outcome);
            }
            if let Some(outcome) = self.serve_from_remote(&doc_id, &doc_name).await {
                return Ok(outcome);
            }
        }

        let converter = self
            .converter
            .clone()
            .ok_or(ConvertError::MissingApiKey)?;

        let path_prefix = match explicit_prefix {
            Some(prefix) => Some(prefix),
            None => self.infer_prefix(&base_url, converter.as_ref()).await,
        };

        let crawl = self.crawler.crawl(&base_url, path_prefix.as_deref()).await;
        let mut report = IndexReport {
            doc_id: doc_id.clone(),
            doc_name: doc_name.clone(),
            path_prefix: path_prefix.clone(),
            pages_discovered: crawl.pages.len(),
            fetch_failures: crawl.failed,
            timed_out: crawl.timed_out,
            ..IndexReport::default()
        };

        if crawl.pages.is_empty() {
            tracing::warn!("No pages discovered at {}", base_url);
            return Ok(IndexOutcome::Empty { report });
        }

        let staging = self.cache.prepare_staging(&doc_id)?;
        let pipeline = Pipeline::new(
            self.crawler.fetcher().clone(),
            converter,
            &self.pipeline_config,
        );
        let result = pipeline.run(crawl.pages, &base_url, &staging).await;

        report.docs_written = result.written.len();
        report.non_doc = result.non_doc;
        report.failed_pages = result.failed;
        report.suggested_prefix = result.suggested_prefix;

        if result.written.is_empty() {
            tracing::warn!("No documentation pages were saved; skipping cache update");
            self.cache.discard_staging(&doc_id)?;
            return Ok(IndexOutcome::Empty { report });
        }

        let metadata = CacheMetadata::new(
            doc_id.clone(),
            doc_name.clone(),
            base_url.to_string(),
            path_prefix,
            self.model.clone(),
            report.pages_discovered,
            report.docs_written,
        );
        self.cache.commit(&metadata)?;
        let (installed, _) = self.cache.install(&doc_id, &doc_name)?;
        tracing::info!("Cached docset {} as {}", doc_name, doc_id);

        if let Some(backend) = &self.backend {
            match backend.upload(&metadata, &result.written).await {
                Ok(()) => {
                    report.uploaded = true;
                    tracing::info!("Uploaded docset {} to shared cache", doc_id);
                }
                Err(e) => tracing::warn!("Failed to upload docset to shared cache: {}", e),
            }
        }

        Ok(IndexOutcome::Indexed {
            metadata,
            installed,
            report,
        })
    }

    /// Resolves an id or name and installs the freshest copy
    ///
    /// Local resolution tries an exact docId, then a unique sanitized name.
    /// A remote copy replaces the local one only when its `createdAt` is
    /// strictly newer.
    pub async fn pull(&self, identifier: &str) -> Result<PullOutcome> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(HarvestError::InvalidInput(
                "docset id or name cannot be empty".to_string(),
            ));
        }

        let mut local = self.find_local(identifier)?;

        let (target_id, target_name) = match &local {
            Some(entry) => (Some(entry.doc_id.clone()), Some(entry.doc_name.clone())),
            None if is_doc_id(identifier) => (Some(identifier.to_string()), None),
            None => (None, Some(identifier.to_string())),
        };

        let remote = match &self.backend {
            Some(backend) => {
                self.find_remote(backend, target_id.as_deref(), target_name.as_deref())
                    .await?
            }
            None => None,
        };

        if local.is_none() && remote.is_none() {
            return Err(HarvestError::NotFound(identifier.to_string()));
        }

        let remote_wins = match (&local, &remote) {
            (None, Some(_)) => true,
            (Some(l), Some(r)) => r.created_at > l.created_at,
            _ => false,
        };

        let mut source = PullSource::Local;
        if remote_wins {
            if let (Some(backend), Some(r)) = (&self.backend, &remote) {
                tracing::info!(
                    "Downloading {} ({}) from shared cache",
                    r.doc_name,
                    r.doc_id
                );
                match self.download_from(backend, &r.doc_id).await {
                    Ok(Some(meta)) => {
                        local = Some(meta);
                        source = PullSource::Remote;
                    }
                    Ok(None) => tracing::warn!("Remote docset {} has no downloadable pages", r.doc_id),
                    Err(e) => tracing::warn!("Failed to download remote docset {}: {}", r.doc_id, e),
                }
            }
        }

        let entry = local.ok_or_else(|| HarvestError::NotFound(identifier.to_string()))?;
        let (installed, files) = self
            .cache
            .install(&entry.doc_id, &sanitize_name(&entry.doc_name))?;

        Ok(PullOutcome {
            metadata: entry,
            installed,
            files,
            source,
        })
    }

    /// Uploads every local docset that has Markdown files
    pub async fn push(&self) -> Result<PushReport> {
        let backend = self.backend.as_ref().ok_or_else(|| {
            HarvestError::InvalidInput("no backend URL configured".to_string())
        })?;

        let mut report = PushReport::default();
        for entry in self.cache.list_entries()? {
            let pages = match self.cache.read_pages(&entry) {
                Ok(pages) => pages,
                Err(e) => {
                    tracing::warn!("Skipping docset {} ({}): {}", entry.doc_name, entry.doc_id, e);
                    report.skipped += 1;
                    continue;
                }
            };

            if pages.is_empty() {
                tracing::warn!(
                    "Skipping docset {} ({}): no Markdown files in the cache",
                    entry.doc_name,
                    entry.doc_id
                );
                report.skipped += 1;
                continue;
            }

            tracing::info!("Pushing {} pages for {}", pages.len(), entry.doc_name);
            match backend.upload(&entry, &pages).await {
                Ok(()) => report.pushed.push(entry.doc_name.clone()),
                Err(e) => {
                    tracing::warn!("Failed to push {}: {}", entry.doc_name, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Local docsets, newest first
    pub fn list_local(&self) -> Result<Vec<CacheMetadata>> {
        Ok(self.cache.list_entries()?)
    }

    /// Remote docsets matching an optional query
    pub async fn list_remote(
        &self,
        query: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RemoteDocset>> {
        let backend = self.backend.as_ref().ok_or_else(|| {
            HarvestError::InvalidInput("no backend URL configured".to_string())
        })?;
        Ok(backend.search_docsets(query, limit, offset).await?)
    }

    /// Downloads a remote docset into the local cache
    ///
    /// Returns `Ok(None)` when the backend has no such docset or none of its
    /// pages could be written.
    pub async fn download_remote(&self, doc_id: &str) -> Result<Option<CacheMetadata>> {
        let backend = self.backend.as_ref().ok_or_else(|| {
            HarvestError::InvalidInput("no backend URL configured".to_string())
        })?;
        self.download_from(backend, doc_id).await
    }

    fn serve_from_cache(&self, doc_id: &str, doc_name: &str) -> Option<IndexOutcome> {
        if !self.cache.has_docs(doc_id) {
            return None;
        }

        let metadata = match self.cache.read_metadata(doc_id) {
            Ok(Some(meta)) => meta,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache entry {}: {}", doc_id, e);
                return None;
            }
        };

        match self.cache.install(doc_id, doc_name) {
            Ok((installed, files)) => {
                tracing::info!("Cache hit for {} ({}), copied {} files", doc_name, doc_id, files);
                Some(IndexOutcome::CacheHit {
                    metadata,
                    installed,
                })
            }
            Err(e) => {
                tracing::warn!("Failed to install cached docset {}: {}", doc_id, e);
                None
            }
        }
    }

    async fn serve_from_remote(&self, doc_id: &str, doc_name: &str) -> Option<IndexOutcome> {
        let backend = self.backend.as_ref()?;

        let metadata = match self.download_from(backend, doc_id).await {
            Ok(Some(meta)) => meta,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Shared cache unavailable: {}", e);
                return None;
            }
        };

        match self.cache.install(doc_id, doc_name) {
            Ok((installed, _)) => {
                tracing::info!(
                    "Served {} docs for {} from shared cache ({})",
                    metadata.docs_stored,
                    doc_name,
                    doc_id
                );
                Some(IndexOutcome::RemoteServed {
                    metadata,
                    installed,
                })
            }
            Err(e) => {
                tracing::warn!("Failed to install downloaded docset {}: {}", doc_id, e);
                None
            }
        }
    }

    /// Fetches metadata and every page, writing through a staging area
    async fn download_from(
        &self,
        backend: &RemoteBackend,
        doc_id: &str,
    ) -> Result<Option<CacheMetadata>> {
        if !is_doc_id(doc_id) {
            return Err(StorageError::InvalidDocId(doc_id.to_string()).into());
        }

        let Some(docset) = backend.get_docset(doc_id).await? else {
            return Ok(None);
        };
        let refs = backend.list_pages(doc_id).await?;
        if refs.is_empty() {
            return Ok(None);
        }

        let mut metadata = docset.into_metadata();
        metadata.doc_id = doc_id.to_string();
        metadata.doc_name = sanitize_name(&metadata.doc_name);

        let source_url = match Url::parse(&metadata.source_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Remote docset {} has an invalid source URL: {}", doc_id, e);
                return Ok(None);
            }
        };

        let staging = self.cache.prepare_staging(doc_id)?;
        let mut written = 0;

        for page_ref in &refs {
            let page = match backend.get_page(doc_id, &page_ref.id).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("Failed to download page {}: {}", page_ref.page_url, e);
                    continue;
                }
            };
            if page.content_markdown.trim().is_empty() {
                continue;
            }

            let page_url = match Url::parse(&page.page_url).or_else(|_| source_url.join(&page.page_url)) {
                Ok(url) => url,
                Err(_) => {
                    tracing::warn!("Skipping remote page with invalid URL {}", page.page_url);
                    continue;
                }
            };

            let mapped = map_url_to_path(&source_url, &page_url);
            match write_document(&staging, &mapped, &page.content_markdown).await {
                Ok(_) => written += 1,
                Err(e) => tracing::warn!("Failed to write {}: {}", page.page_url, e),
            }
        }

        if written == 0 {
            self.cache.discard_staging(doc_id)?;
            return Ok(None);
        }

        metadata.docs_stored = written;
        metadata.pages_indexed = metadata.pages_indexed.max(written);
        self.cache.commit(&metadata)?;
        Ok(Some(metadata))
    }

    fn find_local(&self, identifier: &str) -> Result<Option<CacheMetadata>> {
        let entries = self.cache.list_entries()?;
        if let Some(entry) = entries.iter().find(|e| e.doc_id == identifier) {
            return Ok(Some(entry.clone()));
        }

        let sanitized = sanitize_name(identifier);
        let matches: Vec<&CacheMetadata> =
            entries.iter().filter(|e| e.doc_name == sanitized).collect();
        match matches.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some((*only).clone())),
            many => Err(HarvestError::Ambiguous {
                name: identifier.to_string(),
                candidates: many
                    .iter()
                    .map(|m| m.doc_id.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Looks up the remote copy; backend failures degrade to `None`
    async fn find_remote(
        &self,
        backend: &RemoteBackend,
        doc_id: Option<&str>,
        name: Option<&str>,
    ) -> Result<Option<CacheMetadata>> {
        if let Some(id) = doc_id {
            return Ok(match backend.get_docset(id).await {
                Ok(docset) => docset.map(RemoteDocset::into_metadata),
                Err(e) => {
                    tracing::warn!("Shared cache lookup failed: {}", e);
                    None
                }
            });
        }

        let Some(name) = name else {
            return Ok(None);
        };
        let docsets = match backend
            .search_docsets(Some(name), crate::sync::DEFAULT_LIST_LIMIT, 0)
            .await
        {
            Ok(docsets) => docsets,
            Err(e) => {
                tracing::warn!("Shared cache search failed: {}", e);
                return Ok(None);
            }
        };

        let wanted = sanitize_name(name);
        let matches: Vec<RemoteDocset> = docsets
            .into_iter()
            .filter(|d| sanitize_name(&d.name) == wanted)
            .collect();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.into_iter().next().map(RemoteDocset::into_metadata)),
            _ => Err(HarvestError::Ambiguous {
                name: name.to_string(),
                candidates: matches
                    .iter()
                    .map(|d| d.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    async fn infer_prefix(&self, base_url: &Url, converter: &dyn Converter) -> Option<String> {
        let Some(html) = self.crawler.fetcher().fetch_text(base_url.as_str()).await else {
            tracing::warn!("Could not fetch {} to infer a path prefix", base_url);
            return None;
        };

        let paths = collect_sample_paths(base_url, &html, PREFIX_SAMPLE_SIZE);
        if paths.is_empty() {
            return None;
        }

        match converter.infer_prefix(base_url.as_str(), &paths).await {
            Ok(answer) => match validate_inferred_prefix(&answer) {
                Ok(Some(prefix)) => {
                    tracing::info!("Inferred docs path prefix: {}", prefix);
                    Some(prefix)
                }
                Ok(None) => {
                    tracing::info!("No docs path prefix inferred; crawling entire origin");
                    None
                }
                Err(e) => {
                    tracing::warn!("Rejected inferred prefix: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Failed to infer docs path prefix: {}", e);
                None
            }
        }
    }
}
