//! Data models passed between pipeline stages.
//!
//! This module defines the artifacts of a single fact-check run:
//! - [`ExtractionRequest`] / [`ExtractionResult`]: content extraction input and output
//! - [`Claim`]: a checkable factual assertion found in the content
//! - [`Evidence`] and [`Finding`]: search results gathered for one claim
//! - [`Verdict`]: the truth status assigned to one claim
//! - [`CredibilityReport`]: the terminal artifact of a run
//!
//! Every artifact is owned by the run that created it. Nothing here is cached or
//! shared across runs.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Input to the content extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub url: String,
}

/// Which extraction path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    Primary,
    Fallback,
}

/// Output of the content extractor.
///
/// When `is_error` is set, `content` holds a human-readable diagnostic rather than
/// article text, and `error_detail` repeats it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub content: String,
    pub source: ExtractionSource,
    pub is_error: bool,
    pub error_detail: Option<String>,
}

impl ExtractionResult {
    pub fn success(content: String, source: ExtractionSource) -> Self {
        Self {
            content,
            source,
            is_error: false,
            error_detail: None,
        }
    }

    pub fn failure(detail: impl Into<String>, source: ExtractionSource) -> Self {
        let detail = detail.into();
        Self {
            content: detail.clone(),
            source,
            is_error: true,
            error_detail: Some(detail),
        }
    }
}

/// A discrete, checkable factual assertion.
///
/// Identity is by normalized text; see [`Claim::normalized`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Claim {
    pub text: String,
    #[serde(default)]
    pub rationale: String,
}

impl Claim {
    pub fn new(text: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rationale: rationale.into(),
        }
    }

    /// Case-folded, whitespace-collapsed text with trailing punctuation dropped.
    pub fn normalized(&self) -> String {
        normalize_claim_text(&self.text)
    }
}

impl PartialEq for Claim {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Claim {}

pub fn normalize_claim_text(text: &str) -> String {
    text.split_whitespace()
        .join(" ")
        .trim_end_matches(['.', '!', ';', ','])
        .trim_matches(['"', '\u{201c}', '\u{201d}'])
        .to_lowercase()
}

/// How much a search result's source can be relied upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Reliability {
    High,
    Medium,
    Low,
    Unknown,
}

impl fmt::Display for Reliability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Reliability::High => "high",
            Reliability::Medium => "medium",
            Reliability::Low => "low",
            Reliability::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// One search result kept as evidence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Title and URL of the result.
    pub source_description: String,
    /// The result's URL, used to tell independent outlets apart.
    pub url: String,
    pub reliability: Reliability,
    pub snippet: String,
}

/// The researcher's cheap heuristic label, superseded by the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PreliminaryAssessment {
    Confirmed,
    Contradicted,
    Insufficient,
}

impl fmt::Display for PreliminaryAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PreliminaryAssessment::Confirmed => "Confirmed",
            PreliminaryAssessment::Contradicted => "Contradicted",
            PreliminaryAssessment::Insufficient => "Insufficient Evidence",
        };
        f.write_str(s)
    }
}

/// Aggregated search findings for one claim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub claim: Claim,
    pub query_variants: Vec<String>,
    pub findings: Vec<Finding>,
    pub preliminary_assessment: PreliminaryAssessment,
}

/// Final truth status of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VerdictStatus {
    True,
    False,
    PartiallyTrue,
    Unverifiable,
}

impl VerdictStatus {
    /// Parse a status as a model would write it ("Partially True", "false", ...).
    pub fn parse_loose(raw: &str) -> Option<Self> {
        let key: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "true" | "verified" | "accurate" => Some(VerdictStatus::True),
            "false" | "inaccurate" | "incorrect" => Some(VerdictStatus::False),
            "partiallytrue" | "partlytrue" | "mostlytrue" | "mixed" => {
                Some(VerdictStatus::PartiallyTrue)
            }
            "unverifiable" | "unverified" | "insufficientevidence" | "unknown" => {
                Some(VerdictStatus::Unverifiable)
            }
            _ => None,
        }
    }
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerdictStatus::True => "True",
            VerdictStatus::False => "False",
            VerdictStatus::PartiallyTrue => "Partially True",
            VerdictStatus::Unverifiable => "Unverifiable",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub claim: Claim,
    pub status: VerdictStatus,
    pub justification: String,
}

/// Overall credibility of the checked content, ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CredibilityRating {
    NotCredible,
    SomewhatCredible,
    MostlyCredible,
    HighlyCredible,
}

impl fmt::Display for CredibilityRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CredibilityRating::NotCredible => "Not Credible",
            CredibilityRating::SomewhatCredible => "Somewhat Credible",
            CredibilityRating::MostlyCredible => "Mostly Credible",
            CredibilityRating::HighlyCredible => "Highly Credible",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FinalLabel {
    Real,
    Fake,
    Uncertain,
}

impl fmt::Display for FinalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FinalLabel::Real => "Real",
            FinalLabel::Fake => "Fake",
            FinalLabel::Uncertain => "Uncertain",
        };
        f.write_str(s)
    }
}

/// Terminal artifact of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredibilityReport {
    pub source_url: Option<String>,
    pub overall_assessment: String,
    pub claim_verdicts: Vec<Verdict>,
    pub overall_rating: CredibilityRating,
    pub recommendations: String,
    pub final_label: FinalLabel,
}
