//! Cache and sync management
//!
//! This module reconciles the local cache with the optional shared backend:
//! - Index: local cache, then remote cache, then a fresh crawl
//! - Pull: resolve an id or name and install the freshest copy
//! - Push: upload every local docset
//! - Listing local and remote docsets

mod backend;
mod manager;

pub use backend::{PageId, RemoteBackend, RemoteDocset, RemotePage, RemotePageRef, DEFAULT_LIST_LIMIT};
pub use manager::{
    DocsetManager, IndexOutcome, IndexReport, IndexRequest, PullOutcome, PullSource, PushReport,
    PREFIX_SAMPLE_SIZE,
};

use thiserror::Error;

/// Errors talking to the remote backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Malformed backend response: {0}")]
    Malformed(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}
