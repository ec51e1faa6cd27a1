//! URL handling module for docharvest
//!
//! This module provides base URL validation, same-origin checks, path prefix
//! normalization and docset name sanitizing.

mod name;
mod normalize;
mod origin;

// Re-export main functions
pub use name::{is_doc_id, sanitize_name, validate_doc_name, MAX_NAME_LENGTH};
pub use normalize::{normalize_path_prefix, parse_base_url, validate_inferred_prefix};
pub use origin::{is_http_scheme, matches_prefix, same_origin};
