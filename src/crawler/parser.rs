//! Surface-level HTML scanning for links and titles
//!
//! This is not a DOM parser. Anchors are found with a linear-time
//! regex and the number of matches inspected per document is capped, so
//! pathological markup cannot stall the crawl.

use crate::url::{is_http_scheme, matches_prefix, same_origin};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Maximum anchor matches inspected per document
pub const MAX_ANCHOR_MATCHES: usize = 10_000;

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\s[^>]*?\bhref\s*=\s*["']([^"']*)["']"#).expect("anchor pattern is valid")
});

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title(?:\s[^>]*)?>(.*?)</title\s*>").expect("title pattern is valid")
});

/// Extracts same-origin, prefix-filtered absolute links from a page
///
/// # Link Extraction Rules
///
/// **Skipped hrefs:**
/// - empty or whitespace only
/// - fragment-only (`#section`)
/// - `mailto:` targets
/// - values containing `<` (broken markup)
///
/// **Dropped after resolution against `page_url`:**
/// - URLs that fail to parse
/// - non-http(s) schemes (`javascript:`, `tel:`, `data:` ...)
/// - a different origin than `origin`
/// - a path not starting with `path_prefix` (plain string prefix)
///
/// Fragments are removed from resolved URLs. The result is deduplicated and
/// keeps first-seen order.
///
/// # Example
///
/// ```
/// use docharvest::crawler::extract_links;
/// use url::Url;
///
/// let page = Url::parse("https://ex.com/").unwrap();
/// let html = r#"<a href="/docs/a">A</a><a href="/blog/b">B</a>"#;
/// let links = extract_links(&page, html, &page, Some("/docs"));
/// assert_eq!(links, vec!["https://ex.com/docs/a".to_string()]);
/// ```
pub fn extract_links(
    page_url: &Url,
    html: &str,
    origin: &Url,
    path_prefix: Option<&str>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for url in scan_anchors(page_url, html) {
        if !same_origin(&url, origin) || !matches_prefix(&url, path_prefix) {
            continue;
        }

        let href = url.to_string();
        if seen.insert(href.clone()) {
            links.push(href);
        }
    }

    links
}

/// Collects up to `max` distinct same-origin pathnames linked from a page
///
/// Used as the sample handed to the path prefix inference call.
pub fn collect_sample_paths(base_url: &Url, html: &str, max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for url in scan_anchors(base_url, html) {
        if paths.len() >= max {
            break;
        }
        if !same_origin(&url, base_url) {
            continue;
        }

        let path = if url.path().is_empty() {
            "/".to_string()
        } else {
            url.path().to_string()
        };
        if seen.insert(path.clone()) {
            paths.push(path);
        }
    }

    paths
}

/// Extracts the content of the first `<title>` element, trimmed
pub fn extract_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Yields resolved http(s) URLs for every usable anchor href
fn scan_anchors<'a>(page_url: &'a Url, html: &'a str) -> impl Iterator<Item = Url> + 'a {
    ANCHOR_RE
        .captures_iter(html)
        .take(MAX_ANCHOR_MATCHES)
        .filter_map(move |caps| {
            let href = caps.get(1)?.as_str().trim();
            resolve_href(href, page_url)
        })
}

/// Resolves one href against the page it was found on
fn resolve_href(href: &str, page_url: &Url) -> Option<Url> {
    if href.is_empty() || href.starts_with('#') || href.contains('<') {
        return None;
    }

    if href
        .get(..7)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("mailto:"))
    {
        return None;
    }

    let mut url = page_url.join(href).ok()?;
    if !is_http_scheme(&url) {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}
