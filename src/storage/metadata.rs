//! Docset metadata and the content-addressed docset identifier

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Version of the on-disk metadata layout
pub const CACHE_VERSION: u32 = 1;

/// File name of the metadata record inside a cache entry
pub const METADATA_FILENAME: &str = "metadata.json";

/// Computes the docset identifier for a set of crawl parameters
///
/// The identifier is the first 16 hex chars of
/// `SHA-256(doc_name | "|" | base_url | "|" | path_prefix)`, with an absent
/// prefix hashed as the empty string.
///
/// # Examples
///
/// ```
/// use docharvest::compute_doc_id;
///
/// let a = compute_doc_id("react", "https://react.dev/", Some("/learn"));
/// let b = compute_doc_id("react", "https://react.dev/", Some("/learn"));
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 16);
/// ```
pub fn compute_doc_id(doc_name: &str, base_url: &str, path_prefix: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(doc_name.as_bytes());
    hasher.update(b"|");
    hasher.update(base_url.as_bytes());
    hasher.update(b"|");
    hasher.update(path_prefix.unwrap_or("").as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

/// Metadata record of one cached docset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    pub version: u32,
    pub doc_id: String,
    pub doc_name: String,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub pages_indexed: usize,
    pub docs_stored: usize,
}

impl CacheMetadata {
    /// Creates a record stamped with the current time
    pub fn new(
        doc_id: String,
        doc_name: String,
        source_url: String,
        path_prefix: Option<String>,
        model: String,
        pages_indexed: usize,
        docs_stored: usize,
    ) -> Self {
        Self {
            version: CACHE_VERSION,
            doc_id,
            doc_name,
            source_url,
            path_prefix,
            model,
            created_at: Utc::now(),
            pages_indexed,
            docs_stored,
        }
    }
}

/// One page exchanged with the remote backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendPage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content_markdown: String,
}
