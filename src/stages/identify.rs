//! Claim identification.
//!
//! Three outcomes are possible: a list of claims, a sentinel for unusable content,
//! or a sentinel for content with nothing checkable in it. Unusable content is
//! detected locally before any model call.

use super::PipelineContext;
use crate::agents::{compose_prompt, AgentProfile, TaskSpec};
use crate::api::{ask_for_json, AskAsync, JsonAnswer};
use crate::error::FactCheckError;
use crate::models::{normalize_claim_text, Claim};
use crate::utils::{normalize_whitespace, truncate_for_log};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Upper bound on claims carried forward.
pub const MAX_CLAIMS: usize = 5;

/// Diagnostics the extractor emits, which must never be fact-checked as content.
const ERROR_MARKERS: [&str; 6] = [
    "Error scraping URL",
    "No content found",
    "Could not extract meaningful content",
    "Failed to retrieve content",
    "Failed to extract content",
    "No URL provided",
];

const TASK: TaskSpec = TaskSpec {
    description: r#"
Identify and extract factual claims from the content under [content] that can be verified.
1. If the content contains error messages or is a placeholder page, answer with status "invalid".
2. Separate opinions ("The policy is unfair"), subjective statements ("The situation is dire")
   and predictions ("It might rain tomorrow") from factual claims. Only factual claims qualify:
   statements about events, statistics, or historical facts.
3. Prioritize claims central to the content's main points. Select the 3-5 most significant
   factual claims, or fewer if the content holds fewer.
4. Quote each claim as the exact statement from the content and give a one-line rationale
   explaining why it is a verifiable factual claim.
5. If no factual claims are present, answer with status "none"."#,
    expected_output: r#"
A single JSON object and nothing else:
{"status": "claims" | "invalid" | "none", "claims": [{"text": "<exact claim>", "rationale": "<why it is checkable>"}]}"#,
};

const TRUSTED_SOURCE_NOTE: &str = "This is an article from a mainstream news outlet. Focus on \
     extracting factual claims about events, statistics, and attributions.";

static LIST_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:[-*\u{2022}]|\d+[.)])\s+(?:\*\*)?(?:Claim:)?(?:\*\*)?\s*(.+?)\s*$")
        .expect("LIST_ITEM should compile")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimIdentification {
    Claims(Vec<Claim>),
    InvalidContent,
    NoClaimsFound,
}

#[derive(Debug, Deserialize)]
struct IdentifyResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    claims: Vec<Claim>,
}

/// Prefix of every diagnostic string the pipeline renders.
const DIAGNOSTIC_PREFIX: &str = "Error:";

/// True when `content` is an error diagnostic, a placeholder page, or empty.
///
/// Text that merely begins with the word "Error" is ordinary content; only the
/// `Error:` diagnostic prefix and the known extractor messages are rejected.
pub fn is_invalid_content(content: &str, placeholder_markers: &[String]) -> bool {
    let trimmed = content.trim();
    trimmed.is_empty()
        || trimmed.starts_with(DIAGNOSTIC_PREFIX)
        || ERROR_MARKERS.iter().any(|m| trimmed.contains(m))
        || placeholder_markers.iter().any(|m| trimmed.contains(m.as_str()))
}

/// Identify the checkable claims in `ctx.content`.
#[instrument(level = "info", skip_all, fields(source = %ctx.source_label()))]
pub async fn identify<A>(
    llm: &A,
    profile: &AgentProfile,
    placeholder_markers: &[String],
    ctx: &PipelineContext,
) -> Result<ClaimIdentification, FactCheckError>
where
    A: AskAsync<Response = String>,
{
    if is_invalid_content(&ctx.content, placeholder_markers) {
        warn!(
            preview = %truncate_for_log(ctx.content.trim(), 200),
            "Content is empty, an error diagnostic, or a placeholder"
        );
        return Ok(ClaimIdentification::InvalidContent);
    }

    let mut context = vec![("content", ctx.content.clone())];
    if ctx.trusted_source {
        context.push(("source_note", TRUSTED_SOURCE_NOTE.to_string()));
    }
    let prompt = compose_prompt(profile, &TASK, &context);

    let answer = ask_for_json::<_, IdentifyResponse>(llm, &prompt)
        .await
        .map_err(|e| FactCheckError::stage_fault("claim identification", e))?;

    let outcome = match answer {
        JsonAnswer::Parsed(response) => from_response(response),
        JsonAnswer::Unparsed(raw) => from_raw_text(&raw)?,
    };

    if let ClaimIdentification::Claims(claims) = &outcome {
        let haystack = normalize_claim_text(&ctx.content);
        for claim in claims {
            if !haystack.contains(&claim.normalized()) {
                debug!(claim = %claim.text, "Claim is not a verbatim span of the content");
            }
        }
        info!(count = claims.len(), "Identified claims");
    }
    Ok(outcome)
}

fn from_response(response: IdentifyResponse) -> ClaimIdentification {
    let status = response.status.unwrap_or_default().to_lowercase();
    if status == "invalid" {
        return ClaimIdentification::InvalidContent;
    }
    finalize(response.claims)
}

/// Interpret a free-text answer: the two sentinel phrases, or a bullet list.
fn from_raw_text(raw: &str) -> Result<ClaimIdentification, FactCheckError> {
    let lower = raw.to_lowercase();
    if lower.contains("invalid or inaccessible content") {
        return Ok(ClaimIdentification::InvalidContent);
    }
    if lower.contains("no verifiable factual claims") {
        return Ok(ClaimIdentification::NoClaimsFound);
    }

    let claims: Vec<Claim> = LIST_ITEM
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_matches(['"', '\u{201c}', '\u{201d}']).to_string())
        .map(|text| Claim::new(text, ""))
        .collect();
    if claims.is_empty() {
        return Err(FactCheckError::stage_fault(
            "claim identification",
            format!(
                "model response did not match the expected format: {}",
                truncate_for_log(raw, 200)
            ),
        ));
    }
    Ok(finalize(claims))
}

/// Drop blanks and duplicates, cap the count.
fn finalize(claims: Vec<Claim>) -> ClaimIdentification {
    let claims: Vec<Claim> = claims
        .into_iter()
        .map(|c| Claim::new(normalize_whitespace(&c.text), normalize_whitespace(&c.rationale)))
        .filter(|c| !c.text.is_empty())
        .unique_by(Claim::normalized)
        .take(MAX_CLAIMS)
        .collect();
    if claims.is_empty() {
        ClaimIdentification::NoClaimsFound
    } else {
        ClaimIdentification::Claims(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentRoster;
    use std::collections::HashSet;
    use std::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Canned {
        answer: String,
        calls: AtomicUsize,
    }

    impl Canned {
        fn new(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl AskAsync for Canned {
        type Response = String;

        async fn ask(&self, _text: &str) -> Result<String, Box<dyn Error>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    fn markers() -> Vec<String> {
        vec!["Example Domain".to_string()]
    }

    async fn run(llm: &Canned, content: &str) -> Result<ClaimIdentification, FactCheckError> {
        let roster = AgentRoster::default();
        let ctx = PipelineContext::new(None, false, content.to_string());
        identify(llm, &roster.claim_identifier, &markers(), &ctx).await
    }

    #[test]
    fn test_invalid_content_detection() {
        let m = markers();
        assert!(is_invalid_content("", &m));
        assert!(is_invalid_content("   \n", &m));
        assert!(is_invalid_content("Error: Failed to retrieve content. Status code: 403", &m));
        assert!(is_invalid_content("Example Domain This domain is for use in examples.", &m));
        assert!(is_invalid_content("Error scraping URL https://a.test: timed out", &m));
        assert!(!is_invalid_content("The river flooded in 2019.", &m));
        assert!(!is_invalid_content(
            "Error rates in hospital prescriptions fell by 20 percent in 2023, the NHS reported.",
            &m
        ));
    }

    #[tokio::test]
    async fn test_text_starting_with_error_word_reaches_model() {
        let llm = Canned::new(
            r#"{"status": "claims", "claims": [{"text": "Error rates in hospital prescriptions fell by 20 percent in 2023.", "rationale": "A statistic."}]}"#,
        );
        let outcome = run(&llm, "Error rates in hospital prescriptions fell by 20 percent in 2023, the NHS reported.")
            .await
            .unwrap();
        assert!(matches!(outcome, ClaimIdentification::Claims(ref c) if c.len() == 1));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_content_short_circuits_without_model_call() {
        let llm = Canned::new("{}");
        assert_eq!(run(&llm, "").await.unwrap(), ClaimIdentification::InvalidContent);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_facts_identified_and_opinions_excluded() {
        let content = "The bridge opened in 1966. It cost 4.8 million pounds. \
                       It carries about 30,000 vehicles a day. \
                       It is the most beautiful bridge in Scotland. Everyone should visit it.";
        let llm = Canned::new(
            r#"```json
{"status": "claims", "claims": [
  {"text": "The bridge opened in 1966.", "rationale": "A dated event."},
  {"text": "It cost 4.8 million pounds.", "rationale": "A statistic."},
  {"text": "It carries about 30,000 vehicles a day.", "rationale": "A measurable figure."}
]}
```"#,
        );
        let ClaimIdentification::Claims(claims) = run(&llm, content).await.unwrap() else {
            panic!("expected claims");
        };
        let got: HashSet<String> = claims.iter().map(Claim::normalized).collect();
        let want: HashSet<String> = [
            "It carries about 30,000 vehicles a day.",
            "The bridge opened in 1966.",
            "It cost 4.8 million pounds.",
        ]
        .iter()
        .map(|t| normalize_claim_text(t))
        .collect();
        assert_eq!(got, want);
        assert!(!got.iter().any(|c| c.contains("beautiful") || c.contains("should visit")));
    }

    #[tokio::test]
    async fn test_claims_are_deduped_and_capped() {
        let items: Vec<String> = (1..=7)
            .map(|i| format!(r#"{{"text": "Fact number {i}.", "rationale": "r"}}"#))
            .chain(std::iter::once(r#"{"text": "fact number 1", "rationale": "dup"}"#.to_string()))
            .collect();
        let answer = format!(r#"{{"status": "claims", "claims": [{}]}}"#, items.join(","));
        let llm = Canned::new(&answer);
        let ClaimIdentification::Claims(claims) = run(&llm, "Some article text.").await.unwrap() else {
            panic!("expected claims");
        };
        assert_eq!(claims.len(), MAX_CLAIMS);
        assert_eq!(claims[0].text, "Fact number 1.");
    }

    #[tokio::test]
    async fn test_model_statuses_map_to_sentinels() {
        let llm = Canned::new(r#"{"status": "invalid", "claims": []}"#);
        assert_eq!(run(&llm, "text").await.unwrap(), ClaimIdentification::InvalidContent);

        let llm = Canned::new(r#"{"status": "none", "claims": []}"#);
        assert_eq!(run(&llm, "text").await.unwrap(), ClaimIdentification::NoClaimsFound);

        let llm = Canned::new("No verifiable factual claims were identified in the content.");
        assert_eq!(run(&llm, "text").await.unwrap(), ClaimIdentification::NoClaimsFound);
    }

    #[tokio::test]
    async fn test_bullet_list_answer_is_accepted() {
        let llm = Canned::new("Here are the claims:\n1. **Claim:** \"The dam is 221 metres tall.\"\n2. The dam was completed in 1936.\n");
        let ClaimIdentification::Claims(claims) = run(&llm, "text").await.unwrap() else {
            panic!("expected claims");
        };
        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0].text, "The dam is 221 metres tall.");
        assert_eq!(claims[1].text, "The dam was completed in 1936.");
    }

    #[tokio::test]
    async fn test_unusable_answer_is_stage_fault() {
        let llm = Canned::new("I cannot help with that.");
        assert!(matches!(
            run(&llm, "text").await,
            Err(FactCheckError::UnhandledStageFault { .. })
        ));
    }
}
