//! Credibility summary.
//!
//! The rating and the final label are computed here from the verdicts; the language
//! model only writes the narrative around them.
//!
//! Scoring: with `n` verdicts, `score = (true + 0.5 * partially_true) / n` and
//! `supported = true + partially_true`.
//!
//! | Condition (first match wins) | Rating |
//! |------------------------------|--------|
//! | `n == 0` | Somewhat Credible |
//! | `false > 0` and `false >= supported` | Not Credible |
//! | `score >= 0.8` and no false verdict | Highly Credible |
//! | `score >= 0.6` | Mostly Credible |
//! | `score >= 0.3` | Somewhat Credible |
//! | otherwise | Not Credible |
//!
//! Adding a false or unverifiable verdict never raises the rating: the false count
//! only grows, `supported` stays put and `score` only shrinks.

use super::PipelineContext;
use crate::agents::{compose_prompt, AgentProfile, TaskSpec};
use crate::api::{ask_for_json, AskAsync, JsonAnswer};
use crate::error::FactCheckError;
use crate::models::{
    CredibilityRating, CredibilityReport, Evidence, FinalLabel, PreliminaryAssessment, Verdict,
    VerdictStatus,
};
use serde::Deserialize;
use std::fmt::Write;
use tracing::{info, instrument};

const TASK: TaskSpec = TaskSpec {
    description: r#"
Create a credibility summary of the fact-check results under [verdicts].
1. Write an overall assessment of the content's credibility, consistent with the rating
   under [rating].
2. Mention which key claims were verified and which were disputed.
3. Give recommendations for readers, such as checking specific claims with other
   reputable sources."#,
    expected_output: r#"
A single JSON object and nothing else:
{"overallAssessment": "<two to four sentences>", "recommendations": "<one to three sentences>"}"#,
};

const DEFAULT_RECOMMENDATIONS: &str =
    "Cross-reference the claims above with other reputable sources before relying on them.";

const LOW_CREDIBILITY_MARKER: &str = "low credibility";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    overall_assessment: String,
    #[serde(default)]
    recommendations: String,
}

/// Rating from verdict counts alone. See the module docs for the thresholds.
pub fn rate(verdicts: &[Verdict]) -> CredibilityRating {
    let n = verdicts.len();
    if n == 0 {
        return CredibilityRating::SomewhatCredible;
    }
    let count = |status: VerdictStatus| verdicts.iter().filter(|v| v.status == status).count();
    let trues = count(VerdictStatus::True);
    let partial = count(VerdictStatus::PartiallyTrue);
    let falses = count(VerdictStatus::False);
    let supported = trues + partial;

    let score = (trues as f64 + 0.5 * partial as f64) / n as f64;

    if falses > 0 && falses >= supported {
        CredibilityRating::NotCredible
    } else if score >= 0.8 && falses == 0 {
        CredibilityRating::HighlyCredible
    } else if score >= 0.6 {
        CredibilityRating::MostlyCredible
    } else if score >= 0.3 {
        CredibilityRating::SomewhatCredible
    } else {
        CredibilityRating::NotCredible
    }
}

/// Lift a trusted source's rating to at least Mostly Credible when nothing was
/// found false and no evidence contradicted a claim.
pub fn apply_trusted_floor(
    rating: CredibilityRating,
    trusted_source: bool,
    verdicts: &[Verdict],
    evidence: &[Evidence],
) -> CredibilityRating {
    let clean = !verdicts.iter().any(|v| v.status == VerdictStatus::False)
        && !evidence
            .iter()
            .any(|e| e.preliminary_assessment == PreliminaryAssessment::Contradicted);
    if trusted_source && clean {
        rating.max(CredibilityRating::MostlyCredible)
    } else {
        rating
    }
}

pub fn final_label(rating: CredibilityRating, low_credibility_marker: bool) -> FinalLabel {
    match rating {
        CredibilityRating::HighlyCredible | CredibilityRating::MostlyCredible => FinalLabel::Real,
        CredibilityRating::NotCredible => FinalLabel::Fake,
        CredibilityRating::SomewhatCredible if low_credibility_marker => FinalLabel::Fake,
        CredibilityRating::SomewhatCredible => FinalLabel::Uncertain,
    }
}

/// Produce the credibility report for the verdicts in `ctx`.
#[instrument(level = "info", skip_all, fields(source = %ctx.source_label(), verdicts = ctx.verdicts.len()))]
pub async fn summarize<A>(
    llm: &A,
    profile: &AgentProfile,
    ctx: &PipelineContext,
) -> Result<CredibilityReport, FactCheckError>
where
    A: AskAsync<Response = String>,
{
    let base = rate(&ctx.verdicts);
    let rating = apply_trusted_floor(base, ctx.trusted_source, &ctx.verdicts, &ctx.evidence);
    if rating != base {
        info!(from = %base, to = %rating, "Trusted-source floor applied");
    }

    let context = vec![
        ("source", ctx.source_label().to_string()),
        ("verdicts", render_verdicts(&ctx.verdicts)),
        ("rating", rating.to_string()),
    ];
    let prompt = compose_prompt(profile, &TASK, &context);

    let answer = ask_for_json::<_, SummaryResponse>(llm, &prompt)
        .await
        .map_err(|e| FactCheckError::stage_fault("credibility summary", e))?;

    let (overall_assessment, recommendations) = match answer {
        JsonAnswer::Parsed(r) => (r.overall_assessment.trim().to_string(), r.recommendations.trim().to_string()),
        JsonAnswer::Unparsed(raw) => (raw.trim().to_string(), String::new()),
    };
    let recommendations = if recommendations.is_empty() {
        DEFAULT_RECOMMENDATIONS.to_string()
    } else {
        recommendations
    };

    let marker = overall_assessment.to_lowercase().contains(LOW_CREDIBILITY_MARKER);
    let label = final_label(rating, marker);
    info!(%rating, %label, "Credibility summary complete");

    Ok(CredibilityReport {
        source_url: ctx.source_url.clone(),
        overall_assessment,
        claim_verdicts: ctx.verdicts.clone(),
        overall_rating: rating,
        recommendations,
        final_label: label,
    })
}

fn render_verdicts(verdicts: &[Verdict]) -> String {
    let mut out = String::new();
    for v in verdicts {
        let _ = writeln!(out, "- Claim: {} | Status: {} | {}", v.claim.text, v.status, v.justification);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentRoster;
    use crate::models::Claim;
    use std::error::Error;
    use crate::models::CredibilityRating::*;
    use crate::models::VerdictStatus::*;

    fn verdicts(statuses: &[VerdictStatus]) -> Vec<Verdict> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, s)| Verdict {
                claim: Claim::new(format!("Claim {i}"), ""),
                status: *s,
                justification: "because".to_string(),
            })
            .collect()
    }

    fn evidence(preliminary: PreliminaryAssessment) -> Evidence {
        Evidence {
            claim: Claim::new("Claim 0", ""),
            query_variants: vec![],
            findings: vec![],
            preliminary_assessment: preliminary,
        }
    }

    #[test]
    fn test_rating_thresholds() {
        assert_eq!(rate(&[]), SomewhatCredible);
        assert_eq!(rate(&verdicts(&[True, True, True, True, True])), HighlyCredible);
        assert_eq!(rate(&verdicts(&[True, True, True, True, PartiallyTrue])), HighlyCredible);
        assert_eq!(rate(&verdicts(&[True, True, True, True, False])), MostlyCredible);
        assert_eq!(rate(&verdicts(&[True, True, Unverifiable])), MostlyCredible);
        assert_eq!(rate(&verdicts(&[True, Unverifiable, Unverifiable])), SomewhatCredible);
        assert_eq!(rate(&verdicts(&[Unverifiable, Unverifiable])), NotCredible);
        assert_eq!(rate(&verdicts(&[True, False])), NotCredible);
        assert_eq!(rate(&verdicts(&[True, False, Unverifiable])), NotCredible);
        assert_eq!(rate(&verdicts(&[True, True, False, False, Unverifiable])), NotCredible);
        assert_eq!(rate(&verdicts(&[True, True, True, False])), MostlyCredible);
    }

    #[test]
    fn test_adding_bad_verdicts_never_raises_rating() {
        let starts: [&[VerdictStatus]; 6] = [
            &[True],
            &[True, False],
            &[True, True, False, False],
            &[True, PartiallyTrue, True],
            &[PartiallyTrue, Unverifiable],
            &[True, True, True, True, False],
        ];
        for start in starts {
            for added in [False, Unverifiable] {
                let mut set = verdicts(start);
                let mut previous = rate(&set);
                for _ in 0..4 {
                    set.push(Verdict {
                        claim: Claim::new(format!("Claim {}", set.len()), ""),
                        status: added,
                        justification: String::new(),
                    });
                    let next = rate(&set);
                    assert!(next <= previous, "adding {added} to {start:?} raised {previous} to {next}");
                    previous = next;
                }
            }
        }
    }

    #[test]
    fn test_adding_bad_verdicts_never_raises_trusted_rating() {
        let ev = [evidence(PreliminaryAssessment::Insufficient)];
        let mut set = verdicts(&[True, PartiallyTrue]);
        let mut previous = apply_trusted_floor(rate(&set), true, &set, &ev);
        for added in [Unverifiable, Unverifiable, False, Unverifiable] {
            set.push(Verdict {
                claim: Claim::new(format!("Claim {}", set.len()), ""),
                status: added,
                justification: String::new(),
            });
            let next = apply_trusted_floor(rate(&set), true, &set, &ev);
            assert!(next <= previous);
            previous = next;
        }
    }

    #[test]
    fn test_rating_is_monotonic() {
        let base = verdicts(&[True, PartiallyTrue, Unverifiable, Unverifiable]);
        let before = rate(&base);

        // Upgrading any verdict toward true never lowers the rating.
        let ladder = [False, Unverifiable, PartiallyTrue, True];
        for i in 0..base.len() {
            let rank = ladder.iter().position(|s| *s == base[i].status).unwrap();
            for better in &ladder[rank..] {
                let mut changed = base.clone();
                changed[i].status = *better;
                assert!(rate(&changed) >= before, "upgrading {i} to {better} lowered the rating");
            }
        }

        // Turning any verdict false never raises it.
        for i in 0..base.len() {
            let mut changed = base.clone();
            changed[i].status = False;
            assert!(rate(&changed) <= before);
        }
    }

    #[test]
    fn test_trusted_floor() {
        let clean = verdicts(&[True, Unverifiable, Unverifiable]);
        let ev = [evidence(PreliminaryAssessment::Insufficient)];
        assert_eq!(apply_trusted_floor(SomewhatCredible, true, &clean, &ev), MostlyCredible);
        assert_eq!(apply_trusted_floor(HighlyCredible, true, &clean, &ev), HighlyCredible);
        assert_eq!(apply_trusted_floor(SomewhatCredible, false, &clean, &ev), SomewhatCredible);

        let with_false = verdicts(&[True, False]);
        assert_eq!(apply_trusted_floor(NotCredible, true, &with_false, &ev), NotCredible);

        let contradicted = [evidence(PreliminaryAssessment::Contradicted)];
        assert_eq!(apply_trusted_floor(SomewhatCredible, true, &clean, &contradicted), SomewhatCredible);
    }

    #[test]
    fn test_label_mapping() {
        assert_eq!(final_label(HighlyCredible, false), FinalLabel::Real);
        assert_eq!(final_label(MostlyCredible, false), FinalLabel::Real);
        assert_eq!(final_label(MostlyCredible, true), FinalLabel::Real);
        assert_eq!(final_label(SomewhatCredible, false), FinalLabel::Uncertain);
        assert_eq!(final_label(SomewhatCredible, true), FinalLabel::Fake);
        assert_eq!(final_label(NotCredible, false), FinalLabel::Fake);
    }

    struct Canned(&'static str);

    impl AskAsync for Canned {
        type Response = String;

        async fn ask(&self, _text: &str) -> Result<String, Box<dyn Error>> {
            Ok(self.0.to_string())
        }
    }

    fn ctx(statuses: &[VerdictStatus]) -> PipelineContext {
        let mut ctx = PipelineContext::new(None, false, "text".to_string());
        ctx.verdicts = verdicts(statuses);
        ctx
    }

    #[tokio::test]
    async fn test_summarize_uses_model_narrative_and_computed_rating() {
        let llm = Canned(r#"{"overallAssessment": "Well supported.", "recommendations": "Read on."}"#);
        let report = summarize(&llm, &AgentRoster::default().credibility_summarizer, &ctx(&[True, True, True]))
            .await
            .unwrap();
        assert_eq!(report.overall_rating, HighlyCredible);
        assert_eq!(report.final_label, FinalLabel::Real);
        assert_eq!(report.overall_assessment, "Well supported.");
        assert_eq!(report.recommendations, "Read on.");
        assert_eq!(report.claim_verdicts.len(), 3);
        assert_eq!(report.source_url, None);
    }

    #[tokio::test]
    async fn test_low_credibility_marker_makes_uncertain_fake() {
        let llm = Canned("The content shows LOW CREDIBILITY overall.");
        let report = summarize(
            &llm,
            &AgentRoster::default().credibility_summarizer,
            &ctx(&[True, Unverifiable, Unverifiable]),
        )
        .await
        .unwrap();
        assert_eq!(report.overall_rating, SomewhatCredible);
        assert_eq!(report.final_label, FinalLabel::Fake);
        assert_eq!(report.recommendations, DEFAULT_RECOMMENDATIONS);
    }
}
