//! Plain-text rendering of a credibility report.

use crate::models::CredibilityReport;
use std::fmt::Write;

/// Render `report` as the text returned to callers.
///
/// ```text
/// Based on the provided content from https://www.bbc.co.uk/news/articles/x:
/// 1. Overall Assessment: ...
/// 2. Summary of Key Verified and Disputed Claims:
///    - Claim: ... Verified: True (...)
/// 3. Overall Credibility Rating: Mostly Credible
/// 4. Recommendations: ...
///
/// **Real**
/// ```
pub fn render_report(report: &CredibilityReport) -> String {
    let source = report.source_url.as_deref().unwrap_or("the provided text");
    let mut out = String::new();
    let _ = writeln!(out, "Based on the provided content from {source}:");
    let _ = writeln!(out, "1. Overall Assessment: {}", report.overall_assessment);
    let _ = writeln!(out, "2. Summary of Key Verified and Disputed Claims:");
    for verdict in &report.claim_verdicts {
        let _ = write!(out, "   - Claim: {} Verified: {}", verdict.claim.text, verdict.status);
        if !verdict.justification.is_empty() {
            let _ = write!(out, " ({})", verdict.justification);
        }
        out.push('\n');
    }
    let _ = writeln!(out, "3. Overall Credibility Rating: {}", report.overall_rating);
    let _ = writeln!(out, "4. Recommendations: {}", report.recommendations);
    let _ = write!(out, "\n**{}**", report.final_label);
    out
}
