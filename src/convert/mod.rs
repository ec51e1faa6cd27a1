//! Conversion and classification boundary
//!
//! Turning HTML into Markdown, and deciding whether a page is documentation
//! at all, is delegated to a remote language model. This module defines the
//! seam the pipeline talks to:
//!
//! - [`Converter`] - the async trait implemented by real and scripted backends
//! - [`Conversion`] - the tagged result; the skip marker is decoded here once
//! - [`ChatCompletionsConverter`] - an OpenAI compatible HTTP implementation

mod chat;
mod prompt;

pub use chat::ChatCompletionsConverter;
pub use prompt::{build_conversion_prompt, build_prefix_prompt};

use async_trait::async_trait;
use thiserror::Error;

/// Sentinel a converter answers with for non-documentation pages
pub const SKIP_MARKER: &str = "__SKIP_NON_DOC__";

/// Sentinel the prefix inference call answers with when there is no docs section
pub const NO_PREFIX_MARKER: &str = "__NO_PREFIX__";

/// Errors raised by a conversion call
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Converter returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Converter returned an empty response")]
    EmptyResponse,

    #[error("Missing API key: set DOCHARVEST_API_KEY or OPENROUTER_API_KEY")]
    MissingApiKey,

    #[error("Invalid API key header value")]
    InvalidApiKey,
}

/// One page handed to the converter
#[derive(Debug, Clone, Copy)]
pub struct ConversionRequest<'a> {
    pub url: &'a str,
    pub title: Option<&'a str>,
    /// Already capped HTML
    pub html: &'a str,
    /// Skip classification and always convert
    pub force_doc: bool,
}

/// Outcome of a conversion call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// The page is documentation; carries its Markdown
    Doc(String),
    /// The converter classified the page as not documentation
    NonDoc,
}

impl Conversion {
    /// Decodes a raw converter reply
    ///
    /// The skip marker is recognized with or without its underscores and
    /// when wrapped in backticks or asterisks. An empty reply is an error.
    pub fn from_response(text: &str) -> Result<Self, ConvertError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ConvertError::EmptyResponse);
        }

        if is_skip_marker(trimmed) {
            Ok(Conversion::NonDoc)
        } else {
            Ok(Conversion::Doc(trimmed.to_string()))
        }
    }

    pub fn is_doc(&self) -> bool {
        matches!(self, Conversion::Doc(_))
    }
}

/// Checks whether a reply is the skip marker, ignoring light Markdown wrapping
pub fn is_skip_marker(text: &str) -> bool {
    let unwrapped = text
        .trim()
        .trim_matches(|c| c == '`' || c == '*')
        .trim();
    unwrapped == SKIP_MARKER || unwrapped == "SKIP_NON_DOC"
}

/// Caps HTML to `max_chars` characters, cutting on a char boundary
pub fn truncate_html(html: &str, max_chars: usize) -> &str {
    match html.char_indices().nth(max_chars) {
        Some((idx, _)) => &html[..idx],
        None => html,
    }
}

/// Remote conversion collaborator
#[async_trait]
pub trait Converter: Send + Sync {
    /// Classifies a page and converts it to Markdown
    async fn convert(&self, request: &ConversionRequest<'_>) -> Result<Conversion, ConvertError>;

    /// Asks for the documentation path prefix of a site
    ///
    /// Returns the raw answer; callers validate it.
    async fn infer_prefix(&self, base_url: &str, paths: &[String]) -> Result<String, ConvertError>;
}
