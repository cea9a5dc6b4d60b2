//! Up-front URL checks, run before any network call.

use crate::error::FactCheckError;
use chrono::{Datelike, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, instrument};

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("URL_PATTERN should compile"));

/// Validate a URL against the current local year.
#[instrument(level = "debug")]
pub fn validate_url(url: &str) -> Result<(), FactCheckError> {
    validate_url_at(url, Local::now().year())
}

/// Validate a URL's format, then reject any 4-digit path segment that reads as a
/// year after `current_year`.
pub fn validate_url_at(url: &str, current_year: i32) -> Result<(), FactCheckError> {
    if !URL_PATTERN.is_match(url) {
        error!(%url, "Invalid URL format");
        return Err(FactCheckError::InvalidUrlFormat);
    }

    if let Some(year) = future_path_year(url, current_year) {
        error!(%url, year, "Future date detected in URL");
        return Err(FactCheckError::FutureDateInUrl { year });
    }
    Ok(())
}

fn future_path_year(url: &str, current_year: i32) -> Option<i32> {
    let after_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let path = after_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    // First segment is the authority.
    path.split('/')
        .skip(1)
        .filter(|seg| seg.len() == 4 && seg.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|seg| seg.parse::<i32>().ok())
        .find(|year| *year > current_year)
}
