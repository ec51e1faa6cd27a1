//! HTTP client for the shared docset backend

use crate::storage::{BackendPage, CacheMetadata, CACHE_VERSION};
use crate::sync::BackendError;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Default page size for remote listings
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Docset record as served by the backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocset {
    pub id: String,
    pub name: String,
    pub source_url: String,
    #[serde(default)]
    pub path_prefix: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub pages_indexed: usize,
    #[serde(default)]
    pub docs_stored: usize,
}

impl RemoteDocset {
    /// Converts the remote record into local cache metadata
    pub fn into_metadata(self) -> CacheMetadata {
        CacheMetadata {
            version: CACHE_VERSION,
            doc_id: self.id,
            doc_name: self.name,
            source_url: self.source_url,
            path_prefix: self.path_prefix,
            model: self.model.unwrap_or_default(),
            created_at: self.created_at,
            pages_indexed: self.pages_indexed,
            docs_stored: self.docs_stored,
        }
    }
}

/// Backend page identifiers may be numbers or strings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PageId {
    Number(u64),
    Text(String),
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageId::Number(n) => write!(f, "{}", n),
            PageId::Text(s) => f.write_str(s),
        }
    }
}

/// Entry of a remote page listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePageRef {
    pub id: PageId,
    pub page_url: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Full remote page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePage {
    pub page_url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content_markdown: String,
}

#[derive(Deserialize)]
struct DocsetEnvelope {
    docset: Option<RemoteDocset>,
}

#[derive(Deserialize)]
struct DocsetListEnvelope {
    #[serde(default)]
    docsets: Vec<RemoteDocset>,
}

#[derive(Deserialize)]
struct PageListEnvelope {
    #[serde(default)]
    pages: Vec<RemotePageRef>,
}

#[derive(Deserialize)]
struct PageEnvelope {
    page: Option<RemotePage>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadRequest<'a> {
    doc_id: &'a str,
    doc_name: &'a str,
    source_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    path_prefix: Option<&'a str>,
    model: &'a str,
    created_at: DateTime<Utc>,
    pages_indexed: usize,
    docs_stored: usize,
    pages: &'a [BackendPage],
}

/// Client for `GET/POST <base>/docsets...`
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: Client,
    base: Url,
}

impl RemoteBackend {
    pub fn new(base_url: &str, client: Client) -> Result<Self, BackendError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| BackendError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(BackendError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Fetches docset metadata; `Ok(None)` on 404
    pub async fn get_docset(&self, doc_id: &str) -> Result<Option<RemoteDocset>, BackendError> {
        let url = self.endpoint(&["docsets", doc_id])?;
        let envelope: Option<DocsetEnvelope> = self.get_json(url, true).await?;
        Ok(envelope.and_then(|e| e.docset))
    }

    /// Searches docsets by free-text query
    pub async fn search_docsets(
        &self,
        query: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RemoteDocset>, BackendError> {
        let mut url = self.endpoint(&["docsets"])?;
        {
            let mut params = url.query_pairs_mut();
            if let Some(q) = query.filter(|q| !q.is_empty()) {
                params.append_pair("q", q);
            }
            params.append_pair("limit", &limit.to_string());
            params.append_pair("offset", &offset.to_string());
        }

        let envelope: Option<DocsetListEnvelope> = self.get_json(url, false).await?;
        Ok(envelope.map(|e| e.docsets).unwrap_or_default())
    }

    /// Lists the pages of a docset
    pub async fn list_pages(&self, doc_id: &str) -> Result<Vec<RemotePageRef>, BackendError> {
        let url = self.endpoint(&["docsets", doc_id, "pages"])?;
        let envelope: Option<PageListEnvelope> = self.get_json(url, false).await?;
        Ok(envelope.map(|e| e.pages).unwrap_or_default())
    }

    /// Fetches one page with its Markdown
    pub async fn get_page(&self, doc_id: &str, page_id: &PageId) -> Result<RemotePage, BackendError> {
        let page_id = page_id.to_string();
        let url = self.endpoint(&["docsets", doc_id, "pages", &page_id])?;
        let envelope: Option<PageEnvelope> = self.get_json(url.clone(), false).await?;
        envelope
            .and_then(|e| e.page)
            .ok_or_else(|| BackendError::Malformed(format!("missing page in response from {}", url)))
    }

    /// Uploads a docset with its full page set
    pub async fn upload(
        &self,
        metadata: &CacheMetadata,
        pages: &[BackendPage],
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&["docsets"])?;
        let body = UploadRequest {
            doc_id: &metadata.doc_id,
            doc_name: &metadata.doc_name,
            source_url: &metadata.source_url,
            path_prefix: metadata.path_prefix.as_deref(),
            model: &metadata.model,
            created_at: metadata.created_at,
            pages_indexed: metadata.pages_indexed,
            docs_stored: metadata.docs_stored,
            pages,
        };

        let resp = self.client.post(url.clone()).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(BackendError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        not_found_is_none: bool,
    ) -> Result<Option<T>, BackendError> {
        tracing::debug!("GET {}", url);
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();

        if status == StatusCode::NOT_FOUND && not_found_is_none {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = resp.bytes().await?;
        let value = serde_json::from_slice(&bytes)
            .map_err(|e| BackendError::Malformed(format!("{}: {}", url, e)))?;
        Ok(Some(value))
    }
}
