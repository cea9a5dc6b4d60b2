//! Pipeline stages after content extraction.
//!
//! | Stage | Module | Talks to |
//! |-------|--------|----------|
//! | Claim identification | [`identify`] | language model |
//! | Claim research | [`research`] | search provider |
//! | Claim verification | [`verify`] | language model |
//! | Credibility summary | [`summarize`] | language model |
//!
//! Stages never look anything up ambiently: everything a stage needs beyond its
//! own input arrives through the [`PipelineContext`] it is handed.

pub mod identify;
pub mod research;
pub mod summarize;
pub mod verify;

use crate::models::{Claim, Evidence, Verdict};

/// State accumulated by one pipeline run and handed to each stage in turn.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    /// The URL the content came from; `None` for raw text input.
    pub source_url: Option<String>,
    /// Whether the source is a trusted outlet.
    pub trusted_source: bool,
    /// Extracted or provided text.
    pub content: String,
    pub claims: Vec<Claim>,
    pub evidence: Vec<Evidence>,
    pub verdicts: Vec<Verdict>,
}

impl PipelineContext {
    pub fn new(source_url: Option<String>, trusted_source: bool, content: String) -> Self {
        Self {
            source_url,
            trusted_source,
            content,
            ..Default::default()
        }
    }

    /// Human-readable description of where the content came from.
    pub fn source_label(&self) -> &str {
        self.source_url.as_deref().unwrap_or("the provided text")
    }
}
