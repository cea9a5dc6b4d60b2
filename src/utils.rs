//! Small string and filesystem helpers shared by the scrapers, the claim stages
//! and the report writer.

use itertools::Itertools;
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Shorten `s` to `max` characters for a log field, noting how many bytes were dropped.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Keep at most `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when a model answer stopped mid-JSON (parse hit end of input).
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Pull the JSON object out of a model response.
///
/// Models often wrap JSON in a Markdown code fence or add a sentence before it.
/// Returns the slice from the first `{` to the last `}`, or from the first `{` to
/// the end when the object was cut off, so truncation still parses as EOF.
pub fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    match response.rfind('}') {
        Some(end) if end > start => Some(&response[start..=end]),
        _ => Some(response[start..].trim_end().trim_end_matches('`').trim_end()),
    }
}

/// Lowercase, hyphen-separated slug for report filenames.
///
/// Punctuation other than `-` is dropped and runs of separators collapse to one `-`.
///
/// ```ignore
/// assert_eq!(slugify_title("Hello World"), "hello-world");
/// assert_eq!(slugify_title("Test - Article!"), "test-article");
/// ```
pub fn slugify_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-')
        .collect::<String>()
        .split(|c: char| c == ' ' || c == '-')
        .filter(|part| !part.is_empty())
        .join("-")
}

/// Create `path` if needed and prove it accepts writes by creating and removing a
/// probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe = std::path::Path::new(path).join(".fact_check_write_probe");
    fs::write(&probe, b"").await?;
    if let Err(e) = fs::remove_file(&probe).await {
        warn!(probe = %probe.display(), error = %e, "Could not remove write probe");
    }
    info!("Output directory is writable");
    Ok(())
}
