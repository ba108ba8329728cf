//! Utility functions for URL validation, text cleanup and logging.
//!
//! This module provides helpers used throughout the crate:
//! - URL validation for caller-supplied strings
//! - Whitespace collapsing and HTML stripping for feed-provided text
//! - String truncation for log output

use crate::error::{CrawlError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use url::Url;

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Parse a caller-supplied string as an absolute `http`/`https` URL.
///
/// # Errors
///
/// Returns [`CrawlError::Validation`] for empty strings, relative paths and
/// any scheme other than `http`/`https`.
pub fn parse_http_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CrawlError::Validation("URL must not be empty".to_string()));
    }
    let url = Url::parse(trimmed)?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        scheme => Err(CrawlError::Validation(format!(
            "unsupported URL scheme '{scheme}' in {trimmed}"
        ))),
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    RE_WS.replace_all(s, " ").trim().to_string()
}

/// Reduce an HTML fragment (as found in feed summaries) to plain text.
///
/// Entities are decoded by the HTML parser.
pub fn strip_html(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    let text = parsed.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` bytes (moved back to a character boundary)
/// with an ellipsis and byte count appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}
