use crate::UrlError;
use url::Url;

/// Parses and validates the base URL of a crawl
///
/// # Validation Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Only `http` and `https` schemes are accepted
/// 3. The URL must carry a host
///
/// No further canonicalization happens: the crawler compares URLs by exact
/// string equality, so `https://ex.com/docs` and `https://ex.com/docs/` are
/// two different pages.
///
/// # Examples
///
/// ```
/// use docharvest::url::parse_base_url;
///
/// let url = parse_base_url("https://example.com").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/");
/// assert!(parse_base_url("ftp://example.com").is_err());
/// ```
pub fn parse_base_url(raw: &str) -> Result<Url, UrlError> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Normalizes a user supplied path prefix
///
/// Whitespace is trimmed, an empty prefix means "no prefix", and a leading
/// slash is added when missing. No trailing slash is forced: matching is a
/// plain string prefix test against the URL path.
///
/// # Examples
///
/// ```
/// use docharvest::url::normalize_path_prefix;
///
/// assert_eq!(normalize_path_prefix(Some(" docs ")).unwrap(), Some("/docs".to_string()));
/// assert_eq!(normalize_path_prefix(Some("")).unwrap(), None);
/// assert!(normalize_path_prefix(Some("/docs/../admin")).is_err());
/// ```
pub fn normalize_path_prefix(prefix: Option<&str>) -> Result<Option<String>, UrlError> {
    let Some(raw) = prefix else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let prefixed = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };

    reject_traversal(&prefixed)?;
    Ok(Some(prefixed))
}

/// Validates a prefix produced by the inference call
///
/// Only the first line of the answer is considered. `__NO_PREFIX__` or an
/// empty answer yields `None`; anything containing traversal sequences is an
/// error.
pub fn validate_inferred_prefix(answer: &str) -> Result<Option<String>, UrlError> {
    let first_line = answer.trim().lines().next().unwrap_or("").trim();
    if first_line.is_empty() || first_line == "__NO_PREFIX__" {
        return Ok(None);
    }
    normalize_path_prefix(Some(first_line))
}

fn reject_traversal(prefix: &str) -> Result<(), UrlError> {
    let has_dot_segment = prefix.split('/').any(|segment| segment == "..");

    if has_dot_segment
        || prefix.contains('\\')
        || prefix.contains('\0')
        || prefix.contains("://")
        || prefix.contains(char::is_whitespace)
    {
        return Err(UrlError::InvalidPrefix(prefix.to_string()));
    }

    Ok(())
}
