//! Mapping page URLs onto a sanitized Markdown file tree
//!
//! Every page URL becomes a relative path under a document root:
//!
//! | Page path | Mapped file |
//! |-----------|-------------|
//! | equal to the base path, or empty | `index.md` |
//! | `/a` | `a/index.md` |
//! | `/a/b` | `a/b.md` |
//! | `/a/b/c/` | `a/b/c.md` |
//!
//! Segments are sanitized one by one, and the composed path is checked to
//! stay inside the root before anything is written.

use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use url::Url;

/// Longest sanitized path segment
pub const MAX_SEGMENT_LENGTH: usize = 64;

const RESERVED_DEVICE_NAMES: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// Path integrity errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Path '{0}' escapes the document root")]
    Escape(String),

    #[error("Empty relative path")]
    Empty,
}

/// A mapped location, relative to a document root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedPath {
    /// `/`-joined parent directories; empty for the root
    pub directory: String,
    /// File name, always ending in `.md`
    pub filename: String,
}

impl MappedPath {
    fn root_index() -> Self {
        Self {
            directory: String::new(),
            filename: "index.md".to_string(),
        }
    }

    /// Relative path as a `/`-joined string
    pub fn relative(&self) -> String {
        if self.directory.is_empty() {
            self.filename.clone()
        } else {
            format!("{}/{}", self.directory, self.filename)
        }
    }
}

/// Maps a page URL to a file location relative to the document root
///
/// # Examples
///
/// ```
/// use docharvest::storage::map_url_to_path;
/// use url::Url;
///
/// let base = Url::parse("https://ex.com/").unwrap();
/// let page = Url::parse("https://ex.com/a/b").unwrap();
/// assert_eq!(map_url_to_path(&base, &page).relative(), "a/b.md");
/// ```
pub fn map_url_to_path(base_url: &Url, page_url: &Url) -> MappedPath {
    let path = page_url.path();
    if path.is_empty() || path == base_url.path() {
        return MappedPath::root_index();
    }

    let segments: Vec<String> = path
        .trim_matches('/')
        .split('/')
        .filter_map(sanitize_segment)
        .collect();

    match segments.as_slice() {
        [] => MappedPath::root_index(),
        [only] => MappedPath {
            directory: only.clone(),
            filename: "index.md".to_string(),
        },
        [parents @ .., last] => MappedPath {
            directory: parents.join("/"),
            filename: format!("{}.md", last),
        },
    }
}

/// Sanitizes one raw URL path segment
///
/// Returns `None` for blank segments, which are dropped. Segments that
/// sanitize to nothing usable (`""`, `.`, `..`) are replaced with the first
/// 8 hex chars of their SHA-256 digest, and Windows device names get a `_`
/// prefix.
pub fn sanitize_segment(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut cleaned = String::with_capacity(trimmed.len());
    for c in trimmed.nfkc() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            c
        } else {
            '-'
        };
        if c == '-' && cleaned.ends_with('-') {
            continue;
        }
        cleaned.push(c);
    }
    // Only ASCII remains, so byte truncation is safe
    cleaned.truncate(MAX_SEGMENT_LENGTH);

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return Some(short_hash(trimmed));
    }

    let stem = cleaned.split('.').next().unwrap_or("").to_ascii_lowercase();
    if RESERVED_DEVICE_NAMES.contains(&stem.as_str()) {
        cleaned.insert(0, '_');
    }

    Some(cleaned)
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(digest)[..8].to_string()
}

/// Joins a relative path onto `root`, refusing anything that leaves it
///
/// The relative path is normalized lexically: `.` is dropped, `..` pops a
/// component, and absolute components are rejected. The result must lie
/// strictly below `root`.
pub fn resolve_within(root: &Path, relative: &Path) -> Result<PathBuf, PathError> {
    let escape = || PathError::Escape(relative.display().to_string());
    let mut normalized = PathBuf::new();

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                if part.to_string_lossy().contains('\0') {
                    return Err(escape());
                }
                normalized.push(part);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(escape());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(escape()),
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(PathError::Empty);
    }

    let resolved = root.join(&normalized);
    if !resolved.starts_with(root) || resolved == root {
        return Err(escape());
    }
    Ok(resolved)
}

/// Rebuilds a page URL from a Markdown file's path relative to a docs tree
///
/// `index.md` maps to its directory URL and `x.md` to `x`, resolved against
/// `source_url`.
pub fn url_for_relative_path(relative: &str, source_url: &Url) -> String {
    let normalized = relative.replace('\\', "/");
    if normalized.is_empty() || normalized == "index.md" {
        return source_url.to_string();
    }

    let (dir, last) = match normalized.rsplit_once('/') {
        Some((dir, last)) => (dir, last),
        None => ("", normalized.as_str()),
    };

    let target = if last.eq_ignore_ascii_case("index.md") {
        if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        }
    } else {
        let stem = strip_md_extension(last);
        if dir.is_empty() {
            stem.to_string()
        } else {
            format!("{}/{}", dir, stem)
        }
    };

    let target = if target.is_empty() { "./" } else { &target };
    source_url
        .join(target)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| source_url.to_string())
}

fn strip_md_extension(name: &str) -> &str {
    if name.len() >= 3 && name[name.len() - 3..].eq_ignore_ascii_case(".md") {
        &name[..name.len() - 3]
    } else {
        name
    }
}

/// First `# ` heading of a Markdown document
pub fn infer_title(markdown: &str) -> Option<String> {
    markdown
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('#'))
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .map(str::trim)
        .find(|title| !title.is_empty())
        .map(str::to_string)
}
