use crate::HarvestError;

/// Longest raw docset name accepted on input
pub const MAX_NAME_LENGTH: usize = 128;

/// Sanitizes a docset name for use as a directory name and for matching
///
/// Lowercases, trims, replaces every run of characters outside `[a-z0-9-_]`
/// with a single `-` and strips leading/trailing dashes. An empty result
/// becomes `docs`.
///
/// # Examples
///
/// ```
/// use docharvest::url::sanitize_name;
///
/// assert_eq!(sanitize_name("React Docs!"), "react-docs");
/// assert_eq!(sanitize_name("!!!"), "docs");
/// ```
pub fn sanitize_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut in_run = false;

    for c in lower.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }

    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "docs".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Validates a raw docset name and returns its sanitized form
pub fn validate_doc_name(name: &str) -> Result<String, HarvestError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(HarvestError::InvalidInput(
            "docset name cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(HarvestError::InvalidInput(format!(
            "docset name must be at most {} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(sanitize_name(trimmed))
}

/// True when `s` has the shape of a docset id (16 lowercase hex chars)
pub fn is_doc_id(s: &str) -> bool {
    s.len() == 16 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
