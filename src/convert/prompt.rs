//! Prompt construction for the conversion and prefix inference calls

use crate::convert::{ConversionRequest, NO_PREFIX_MARKER, SKIP_MARKER};

const CONTENT_RULES: &str = "Keep as much of the original content as possible. Do not condense \
sections, drop content, or insert placeholders such as '(details omitted)'. Do not add \
commentary or meta notes that are not in the HTML.";

/// Builds the prompt for one page
///
/// The forced variant tells the model the page is documentation and must
/// not be skipped.
pub fn build_conversion_prompt(request: &ConversionRequest<'_>) -> String {
    let mut parts: Vec<String> = Vec::new();

    if request.force_doc {
        parts.push("You format technical documentation as Markdown.".to_string());
        parts.push(
            "This page is known to be product documentation (API reference, configuration, \
             tutorial, how-to or conceptual guide)."
                .to_string(),
        );
        parts.push(format!(
            "Do not classify it and never answer '{}'. Convert the HTML into clean, \
             well-structured Markdown.",
            SKIP_MARKER
        ));
    } else {
        parts.push("You classify web pages and format documentation as Markdown.".to_string());
        parts.push(
            "First decide whether this page is technical product documentation (API reference, \
             configuration, tutorial, how-to or conceptual guide) rather than a marketing, \
             landing, blog, pricing, navigation or legal page."
                .to_string(),
        );
        parts.push(format!(
            "Only clearly non-documentation pages are skipped. Mixed pages with substantial \
             technical material count as documentation. To skip, answer exactly \"{}\" and \
             nothing else.",
            SKIP_MARKER
        ));
        parts.push(
            "For documentation, convert the HTML into clean, well-structured Markdown, keeping \
             headings, lists, code blocks, inline code and important links."
                .to_string(),
        );
    }
    parts.push(CONTENT_RULES.to_string());

    parts.push(String::new());
    parts.push(format!("URL: {}", request.url));
    if let Some(title) = request.title {
        parts.push(format!("Title: {}", title));
    }
    parts.push(String::new());
    parts.push("HTML content:".to_string());
    parts.push(request.html.to_string());

    parts.join("\n")
}

/// Builds the prompt asking for a documentation path prefix
pub fn build_prefix_prompt(base_url: &str, paths: &[String]) -> String {
    let mut lines = vec![
        "You choose the documentation path prefix of a website.".to_string(),
        "Given the base URL and internal pathnames below, answer with the shortest path prefix \
         that most likely holds the documentation (for example '/docs', '/documentation' or \
         '/guide')."
            .to_string(),
        format!(
            "Answer with one prefix only, or '{}' if there is no clear documentation section. \
             No explanation.",
            NO_PREFIX_MARKER
        ),
        String::new(),
        format!("Base URL: {}", base_url),
        "Paths:".to_string(),
    ];
    lines.extend(paths.iter().cloned());
    lines.join("\n")
}
