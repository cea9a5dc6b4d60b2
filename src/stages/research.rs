//! Claim research: web search fan-out and a preliminary heuristic.

use crate::models::{Claim, Evidence, Finding, PreliminaryAssessment};
use crate::scrapers::{SearchHit, SearchProvider};
use crate::sources::SourceClassifier;
use crate::utils::normalize_whitespace;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::{info, instrument, warn};

const NEWS_TERMS: [&str; 9] = [
    "bbc",
    "reuters",
    "associated press",
    "cnn",
    "guardian",
    "new york times",
    "news",
    "reported",
    "announced",
];

const VERIFICATION_TERMS: [&str; 6] = [
    "verify",
    "verified",
    "fact check",
    "fact-check",
    "confirmed",
    "confirm",
];

/// Claims with at most this many words get an extra "announcement" query.
const SHORT_CLAIM_WORDS: usize = 6;

/// Share of the claim's key terms a snippet must contain to count as on-topic.
const OVERLAP_THRESHOLD: f64 = 0.5;

static RECENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:19|20)\d{2}|january|february|march|april|may|june|july|august|september|october|november|december|recent|recently|today|yesterday|(?:this|last) (?:week|month|year))\b",
    )
    .expect("RECENCY should compile")
});

static DEBUNK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:hoax|debunk(?:ed|s)?|fake news|false claim|misleading|fabricated|no evidence|not true|misinformation|disinformation|rated false)\b",
    )
    .expect("DEBUNK should compile")
});

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "that", "this", "with", "from", "have", "been", "were", "will", "would", "said", "says",
        "their", "there", "they", "about", "into", "than", "then", "after", "before", "over",
        "more", "some", "also", "which", "when", "while", "what",
    ]
    .into_iter()
    .collect()
});

/// Search queries for one claim, literal claim first.
pub fn plan_queries(claim_text: &str) -> Vec<String> {
    let base = normalize_whitespace(claim_text);
    let lower = base.to_lowercase();

    let mut queries = vec![base.clone()];
    if NEWS_TERMS.iter().any(|t| lower.contains(t)) && !RECENCY.is_match(&lower) {
        queries.push(format!("{base} recent news"));
    }
    if VERIFICATION_TERMS.iter().any(|t| lower.contains(t)) {
        queries.push(format!("{base} confirmed OR verified by multiple sources"));
    }
    if queries.len() == 1 {
        queries.push(format!("{base} fact check"));
    }
    if base.split_whitespace().count() <= SHORT_CLAIM_WORDS {
        queries.push(format!("{base} announcement"));
    }
    queries.into_iter().unique().collect()
}

/// Run every planned query and collect annotated findings.
///
/// Queries run one after another. A failing query is logged and contributes no
/// findings.
///
/// # Arguments
///
/// * `search` - Backend that answers each query
/// * `classifier` - Tags each hit with a reliability tier
/// * `claim` - The claim to research
///
/// # Returns
///
/// [`Evidence`] holding the queries used, the findings and a preliminary assessment.
#[instrument(level = "info", skip_all, fields(claim = %claim.text))]
pub async fn research<S: SearchProvider>(
    search: &S,
    classifier: &SourceClassifier,
    claim: &Claim,
) -> Evidence {
    let query_variants = plan_queries(&claim.text);
    let mut findings = Vec::new();

    for query in &query_variants {
        match search.search(query).await {
            Ok(hits) => {
                info!(%query, hits = hits.len(), "Query answered");
                findings.extend(hits.into_iter().map(|hit| to_finding(classifier, hit)));
            }
            Err(e) => warn!(%query, error = %e, "Search query failed; skipping"),
        }
    }

    let preliminary_assessment = preliminary_assessment(&claim.text, &findings);
    info!(
        findings = findings.len(),
        preliminary = %preliminary_assessment,
        "Research complete"
    );
    Evidence {
        claim: claim.clone(),
        query_variants,
        findings,
        preliminary_assessment,
    }
}

fn to_finding(classifier: &SourceClassifier, hit: SearchHit) -> Finding {
    Finding {
        source_description: format!("{} ({})", hit.title, hit.url),
        reliability: classifier.reliability(&hit.url),
        url: hit.url,
        snippet: hit.snippet,
    }
}

/// Cheap label from snippets alone; the verifier makes the real call.
pub fn preliminary_assessment(claim_text: &str, findings: &[Finding]) -> PreliminaryAssessment {
    if findings.iter().any(|f| DEBUNK.is_match(&f.snippet)) {
        return PreliminaryAssessment::Contradicted;
    }
    let terms = key_terms(claim_text);
    let on_topic = findings
        .iter()
        .filter(|f| term_overlap(&terms, &format!("{} {}", f.source_description, f.snippet)) >= OVERLAP_THRESHOLD)
        .count();
    if on_topic >= 2 {
        PreliminaryAssessment::Confirmed
    } else {
        PreliminaryAssessment::Insufficient
    }
}

/// Lowercased content words of a claim, four letters or longer.
fn key_terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() >= 4 || w.chars().all(|c| c.is_ascii_digit()) && !w.is_empty())
        .filter(|w| !STOPWORDS.contains(w.as_str()))
        .collect()
}

fn term_overlap(terms: &HashSet<String>, text: &str) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let words: HashSet<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .collect();
    terms.iter().filter(|t| words.contains(*t)).count() as f64 / terms.len() as f64
}
