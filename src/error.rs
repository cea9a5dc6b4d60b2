//! Error types for the fact-checking pipeline.
//!
//! Two layers of errors exist:
//! - [`FetchError`]: failures at a network seam (primary extraction API, raw page
//!   fetch, search). These never cross a stage boundary; the stage that owns the
//!   call converts them into a typed result.
//! - [`FactCheckError`]: the user-facing taxonomy. Its `Display` output is exactly
//!   what the caller of `fact_check_url` / `fact_check_text` sees, so every variant
//!   renders as a plain-text message beginning with `Error:` or a sentinel phrase.

use thiserror::Error;

/// Sentinel returned when the content handed to claim identification is unusable.
pub const INVALID_CONTENT_MESSAGE: &str =
    "Error: No verifiable claims found due to invalid or inaccessible content.";

/// Sentinel returned when the content is valid but holds no checkable facts.
pub const NO_CLAIMS_MESSAGE: &str = "No verifiable factual claims were identified in the content.";

/// Failure at a network seam.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("no API key configured")]
    MissingApiKey,

    #[error("could not parse response: {0}")]
    Parse(String),
}

/// The user-visible failure taxonomy of a fact-check run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FactCheckError {
    #[error("Error: Invalid URL format. Please provide a valid URL starting with http:// or https://.")]
    InvalidUrlFormat,

    #[error("Error: URL contains a future date ({year}), which may not be valid. Please check the URL.")]
    FutureDateInUrl { year: i32 },

    /// Extraction failed; `detail` is the extractor's diagnostic, surfaced verbatim.
    #[error("Error: Failed to extract content from URL: {url}. {detail}")]
    ExtractionFailure { url: String, detail: String },

    #[error("{}", INVALID_CONTENT_MESSAGE)]
    InvalidOrEmptyContent,

    #[error("{}", NO_CLAIMS_MESSAGE)]
    NoClaimsFound,

    #[error("Error: {stage} stage failed: {message}")]
    UnhandledStageFault { stage: String, message: String },
}

impl FactCheckError {
    /// Build a stage fault from any displayable error.
    pub fn stage_fault(stage: impl Into<String>, err: impl std::fmt::Display) -> Self {
        FactCheckError::UnhandledStageFault {
            stage: stage.into(),
            message: err.to_string(),
        }
    }
}
