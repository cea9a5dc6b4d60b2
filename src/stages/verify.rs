//! Claim verification.

use super::PipelineContext;
use crate::agents::{compose_prompt, AgentProfile, TaskSpec};
use crate::api::{ask_for_json, AskAsync, JsonAnswer};
use crate::error::FactCheckError;
use crate::models::{Evidence, PreliminaryAssessment, Reliability, Verdict, VerdictStatus};
use crate::sources::site_tag;
use crate::utils::{truncate_chars, truncate_for_log};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fmt::Write;
use tracing::{info, instrument, warn};

const TASK: TaskSpec = TaskSpec {
    description: r#"
Verify the claim under [claim] against the research findings under [evidence].
1. Compare the claim with what the findings actually say, weighing each source by its
   reliability.
2. Assign exactly one status: "True", "False", "Partially True" or "Unverifiable".
3. Use "Unverifiable" only when the findings neither support nor contradict the claim.
4. Give a short justification that cites the sources you relied on."#,
    expected_output: r#"
A single JSON object and nothing else:
{"status": "True" | "False" | "Partially True" | "Unverifiable", "justification": "<one or two sentences>"}"#,
};

const TRUSTED_SOURCE_NOTE: &str = "The claim comes from a mainstream news outlet. When other \
     reputable outlets report the same event, treat that as corroboration.";

/// Longest raw answer kept as a justification.
const RAW_JUSTIFICATION_CHARS: usize = 500;

static STATUS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[\s*#-]*(?:verification|verdict|status)[\s*]*:[\s*]*([A-Za-z][A-Za-z ]*)")
        .expect("STATUS_LINE should compile")
});

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    status: String,
    #[serde(default)]
    justification: String,
}

/// Assign a verdict to the claim behind `evidence`.
#[instrument(level = "info", skip_all, fields(claim = %evidence.claim.text))]
pub async fn verify<A>(
    llm: &A,
    profile: &AgentProfile,
    ctx: &PipelineContext,
    evidence: &Evidence,
) -> Result<Verdict, FactCheckError>
where
    A: AskAsync<Response = String>,
{
    let mut context = vec![
        ("claim", evidence.claim.text.clone()),
        ("evidence", render_evidence(evidence)),
    ];
    if !evidence.claim.rationale.is_empty() {
        context.insert(1, ("rationale", evidence.claim.rationale.clone()));
    }
    if ctx.trusted_source {
        context.push(("source_note", TRUSTED_SOURCE_NOTE.to_string()));
    }
    let prompt = compose_prompt(profile, &TASK, &context);

    let answer = ask_for_json::<_, VerifyResponse>(llm, &prompt)
        .await
        .map_err(|e| FactCheckError::stage_fault("claim verification", e))?;

    let (model_status, justification) = match answer {
        JsonAnswer::Parsed(response) => match VerdictStatus::parse_loose(&response.status) {
            Some(status) => (status, response.justification),
            None => {
                warn!(status = %response.status, "Unknown verdict status; treating as unverifiable");
                (VerdictStatus::Unverifiable, response.justification)
            }
        },
        JsonAnswer::Unparsed(raw) => {
            let status = status_from_text(&raw).unwrap_or_else(|| {
                warn!(preview = %truncate_for_log(&raw, 200), "No verdict found in answer");
                VerdictStatus::Unverifiable
            });
            (status, truncate_chars(raw.trim(), RAW_JUSTIFICATION_CHARS))
        }
    };

    let status = apply_trusted_prior(model_status, ctx, evidence);
    if status != model_status {
        info!(from = %model_status, to = %status, "Trusted-source prior applied");
    }
    info!(%status, "Claim verified");

    Ok(Verdict {
        claim: evidence.claim.clone(),
        status,
        justification: justification.trim().to_string(),
    })
}

/// Find a "Verification: <status>" style line in free text.
fn status_from_text(raw: &str) -> Option<VerdictStatus> {
    STATUS_LINE.captures_iter(raw).find_map(|caps| {
        let words: Vec<&str> = caps.get(1)?.as_str().split_whitespace().collect();
        // Longest leading phrase that names a status: "Partially True because" -> "Partially True".
        (1..=words.len().min(2))
            .rev()
            .find_map(|n| VerdictStatus::parse_loose(&words[..n].join(" ")))
    })
}

/// Raise an unverifiable verdict to true for a trusted source whose claim is
/// corroborated by independent reputable outlets.
///
/// Any other status is returned unchanged.
pub fn apply_trusted_prior(
    status: VerdictStatus,
    ctx: &PipelineContext,
    evidence: &Evidence,
) -> VerdictStatus {
    if !ctx.trusted_source
        || status != VerdictStatus::Unverifiable
        || evidence.preliminary_assessment != PreliminaryAssessment::Confirmed
    {
        return status;
    }
    let source_tag = ctx.source_url.as_deref().and_then(site_tag);
    let independent = evidence.findings.iter().any(|f| {
        matches!(f.reliability, Reliability::High | Reliability::Medium)
            && site_tag(&f.url).is_some_and(|tag| Some(&tag) != source_tag.as_ref())
    });
    if independent {
        VerdictStatus::True
    } else {
        status
    }
}

fn render_evidence(evidence: &Evidence) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Queries: {}", evidence.query_variants.join(" | "));
    if evidence.findings.is_empty() {
        let _ = writeln!(out, "No search results were found.");
    }
    for (i, finding) in evidence.findings.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} [reliability: {}]\n   {}",
            i + 1,
            finding.source_description,
            finding.reliability,
            finding.snippet
        );
    }
    let _ = write!(out, "Preliminary assessment: {}", evidence.preliminary_assessment);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentRoster;
    use crate::models::{Claim, Finding};
    use std::error::Error;

    struct Canned(&'static str);

    impl AskAsync for Canned {
        type Response = String;

        async fn ask(&self, _text: &str) -> Result<String, Box<dyn Error>> {
            Ok(self.0.to_string())
        }
    }

    struct Down;

    impl AskAsync for Down {
        type Response = String;

        async fn ask(&self, _text: &str) -> Result<String, Box<dyn Error>> {
            Err("connection refused".into())
        }
    }

    fn finding(url: &str, reliability: Reliability) -> Finding {
        Finding {
            source_description: format!("Story ({url})"),
            url: url.to_string(),
            reliability,
            snippet: "The ferry service resumed on Monday.".to_string(),
        }
    }

    fn evidence(findings: Vec<Finding>, preliminary: PreliminaryAssessment) -> Evidence {
        Evidence {
            claim: Claim::new("The ferry service resumed on Monday", "dated event"),
            query_variants: vec!["The ferry service resumed on Monday".to_string()],
            findings,
            preliminary_assessment: preliminary,
        }
    }

    fn bbc_ctx() -> PipelineContext {
        PipelineContext::new(Some("https://www.bbc.co.uk/news/uk-1".to_string()), true, "text".to_string())
    }

    async fn run<A: AskAsync<Response = String>>(llm: &A, ctx: &PipelineContext, ev: &Evidence) -> Result<Verdict, FactCheckError> {
        verify(llm, &AgentRoster::default().claim_verifier, ctx, ev).await
    }

    #[tokio::test]
    async fn test_json_verdict() {
        let ev = evidence(vec![], PreliminaryAssessment::Insufficient);
        let ctx = PipelineContext::new(None, false, "text".to_string());
        let verdict = run(&Canned(r#"{"status": "Partially True", "justification": "Resumed on Tuesday."}"#), &ctx, &ev)
            .await
            .unwrap();
        assert_eq!(verdict.status, VerdictStatus::PartiallyTrue);
        assert_eq!(verdict.justification, "Resumed on Tuesday.");
    }

    #[tokio::test]
    async fn test_verification_line_fallback() {
        let ev = evidence(vec![], PreliminaryAssessment::Insufficient);
        let ctx = PipelineContext::new(None, false, "text".to_string());
        let verdict = run(&Canned("Analysis done.\n**Verification:** False because no outlet reported it."), &ctx, &ev)
            .await
            .unwrap();
        assert_eq!(verdict.status, VerdictStatus::False);
        assert!(verdict.justification.contains("no outlet reported it"));
    }

    #[tokio::test]
    async fn test_unreadable_answer_is_unverifiable() {
        let ev = evidence(vec![], PreliminaryAssessment::Insufficient);
        let ctx = PipelineContext::new(None, false, "text".to_string());
        let verdict = run(&Canned("I am not sure."), &ctx, &ev).await.unwrap();
        assert_eq!(verdict.status, VerdictStatus::Unverifiable);
    }

    #[tokio::test]
    async fn test_model_failure_is_stage_fault() {
        let ev = evidence(vec![], PreliminaryAssessment::Insufficient);
        let ctx = PipelineContext::new(None, false, "text".to_string());
        let err = run(&Down, &ctx, &ev).await.unwrap_err();
        assert!(err.to_string().starts_with("Error: claim verification stage failed"));
    }

    #[tokio::test]
    async fn test_trusted_prior_raises_corroborated_unverifiable() {
        let ev = evidence(
            vec![finding("https://www.reuters.com/world/ferry", Reliability::High)],
            PreliminaryAssessment::Confirmed,
        );
        let verdict = run(&Canned(r#"{"status": "Unverifiable", "justification": "Unclear."}"#), &bbc_ctx(), &ev)
            .await
            .unwrap();
        assert_eq!(verdict.status, VerdictStatus::True);
    }

    #[test]
    fn test_trusted_prior_needs_independent_reputable_corroboration() {
        let ctx = bbc_ctx();
        // Only the outlet itself.
        let same_outlet = evidence(
            vec![finding("https://www.bbc.com/news/ferry", Reliability::High)],
            PreliminaryAssessment::Confirmed,
        );
        assert_eq!(apply_trusted_prior(VerdictStatus::Unverifiable, &ctx, &same_outlet), VerdictStatus::Unverifiable);

        // Independent but low reliability.
        let low = evidence(
            vec![finding("https://www.reddit.com/r/ferry", Reliability::Low)],
            PreliminaryAssessment::Confirmed,
        );
        assert_eq!(apply_trusted_prior(VerdictStatus::Unverifiable, &ctx, &low), VerdictStatus::Unverifiable);

        // Not corroborated.
        let weak = evidence(
            vec![finding("https://www.reuters.com/x", Reliability::High)],
            PreliminaryAssessment::Insufficient,
        );
        assert_eq!(apply_trusted_prior(VerdictStatus::Unverifiable, &ctx, &weak), VerdictStatus::Unverifiable);
    }

    #[test]
    fn test_trust_alone_never_changes_other_statuses() {
        let ctx = bbc_ctx();
        let ev = evidence(
            vec![finding("https://www.reuters.com/x", Reliability::High)],
            PreliminaryAssessment::Confirmed,
        );
        for status in [VerdictStatus::False, VerdictStatus::PartiallyTrue, VerdictStatus::True] {
            assert_eq!(apply_trusted_prior(status, &ctx, &ev), status);
        }
        let untrusted = PipelineContext::new(Some("https://blog.test/x".to_string()), false, String::new());
        assert_eq!(apply_trusted_prior(VerdictStatus::Unverifiable, &untrusted, &ev), VerdictStatus::Unverifiable);
    }

    #[test]
    fn test_status_from_text() {
        assert_eq!(status_from_text("Verification: Partially True because of X"), Some(VerdictStatus::PartiallyTrue));
        assert_eq!(status_from_text("- Verdict: true"), Some(VerdictStatus::True));
        assert_eq!(status_from_text("nothing here"), None);
    }
}
