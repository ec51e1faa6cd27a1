//! Local heuristics used around the conversion call

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

const DOC_PATH_HINTS: &[&str] = &[
    "/docs/",
    "/doc/",
    "/documentation",
    "/guide",
    "/guides/",
    "/manual",
    "/tutorial",
    "/tutorials",
    "/api/",
    "/reference",
    "/classes/",
    "/class_",
];

const DOC_TITLE_KEYWORDS: &[&str] = &[
    "docs",
    "documentation",
    "manual",
    "guide",
    "tutorial",
    "reference",
    "api",
    "class reference",
];

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<pre|<code").expect("code pattern is valid"));

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<h[1-6][^>]*>").expect("heading pattern is valid"));

static TECHNICAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"parameters?|returns|class\s+[A-Z][A-Za-z0-9_]+").expect("technical pattern is valid")
});

/// Whether a page skipped by the converter still looks like documentation
///
/// True when any of these hold:
/// - the URL contains a doc path hint (`/docs/`, `/guide`, `/api/` ...)
/// - the title contains a doc keyword
/// - the HTML has at least 2 code blocks and at least 2 headings
/// - the HTML has a code block or heading plus technical vocabulary
pub fn is_likely_doc(url: &str, title: Option<&str>, html: &str) -> bool {
    let url_lower = url.to_lowercase();
    if DOC_PATH_HINTS.iter().any(|hint| url_lower.contains(hint)) {
        return true;
    }

    let title_lower = title.unwrap_or("").to_lowercase();
    if DOC_TITLE_KEYWORDS.iter().any(|kw| title_lower.contains(kw)) {
        return true;
    }

    let code_blocks = CODE_RE.find_iter(html).take(2).count();
    let headings = HEADING_RE.find_iter(html).take(2).count();
    if code_blocks >= 2 && headings >= 2 {
        return true;
    }

    (code_blocks >= 1 || headings >= 1) && TECHNICAL_RE.is_match(html)
}

/// Sibling `.md` URL of a page
///
/// A trailing `/` becomes `.md`; otherwise `.md` is appended unless the path
/// already ends with it. Query and fragment are kept.
pub fn markdown_url(page_url: &str) -> Option<String> {
    let mut url = Url::parse(page_url).ok()?;
    let path = url.path().to_string();

    let md_path = if let Some(stripped) = path.strip_suffix('/') {
        format!("{}.md", stripped)
    } else if path.ends_with(".md") {
        path
    } else {
        format!("{}.md", path)
    };

    url.set_path(&md_path);
    Some(url.to_string())
}

/// Whether a body is an HTML document rather than Markdown
pub fn looks_like_html(text: &str) -> bool {
    let head: String = text.trim_start().chars().take(16).collect::<String>().to_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}
