//! Storage module for cached docsets
//!
//! This module handles everything that touches the local filesystem:
//! - Mapping page URLs onto a sanitized, traversal-safe Markdown tree
//! - The docset identifier and metadata records
//! - Cache entries keyed by docId, written through a staging area
//! - Installing entries into the user facing document root

mod cache;
mod metadata;
mod paths;

pub use cache::{copy_dir, write_document, LocalCache};
pub use metadata::{compute_doc_id, BackendPage, CacheMetadata, CACHE_VERSION, METADATA_FILENAME};
pub use paths::{
    infer_title, map_url_to_path, resolve_within, sanitize_segment, url_for_relative_path,
    MappedPath, PathError, MAX_SEGMENT_LENGTH,
};

use thiserror::Error;

/// Errors that can occur while reading or writing the local cache
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed metadata: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Invalid docset id: {0}")]
    InvalidDocId(String),

    #[error("No cached docs for docset {0}")]
    MissingEntry(String),
}
