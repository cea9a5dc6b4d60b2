//! JSON report output.
//!
//! Reports are grouped by the local date of the run:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── 142301-www-bbc-co-uk-news-articles-c0ferry.json
//!     └── 150912-provided-text.json
//! ```

use crate::models::CredibilityReport;
use crate::utils::{ensure_writable_dir, normalize_whitespace, slugify_title, truncate_chars};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

const MAX_SLUG_CHARS: usize = 80;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportFile<'a> {
    checked_at: String,
    #[serde(flatten)]
    report: &'a CredibilityReport,
}

/// File stem for a report: source URL without its scheme, or `provided-text`.
pub fn report_slug(report: &CredibilityReport) -> String {
    let label = match report.source_url.as_deref() {
        Some(url) => url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .replace(|c: char| !c.is_alphanumeric(), " "),
        None => "provided text".to_string(),
    };
    let slug = slugify_title(&normalize_whitespace(&label));
    truncate_chars(&slug, MAX_SLUG_CHARS).trim_end_matches('-').to_string()
}

/// Write `report` to `{json_output_dir}/{date}/{HHMMSS}-{slug}.json` and return the path.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_report(
    report: &CredibilityReport,
    json_output_dir: &str,
) -> Result<String, Box<dyn Error>> {
    write_report_at(report, json_output_dir, Local::now()).await
}

async fn write_report_at(
    report: &CredibilityReport,
    json_output_dir: &str,
    now: DateTime<Local>,
) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(&ReportFile {
        checked_at: now.to_rfc3339(),
        report,
    })?;

    let full_json_dir = format!(
        "{}/{}",
        json_output_dir.trim_end_matches('/'),
        now.date_naive()
    );
    info!(%full_json_dir, "Ensuring JSON directory exists");
    if let Err(e) = ensure_writable_dir(&full_json_dir).await {
        error!(%full_json_dir, error = %e, "JSON output directory is not writable");
        return Err(e);
    }

    let path = format!(
        "{}/{}-{}.json",
        full_json_dir,
        now.format("%H%M%S"),
        report_slug(report)
    );
    fs::write(&path, json).await?;
    info!(%path, "Wrote JSON report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CredibilityRating, FinalLabel};
    use chrono::TimeZone;

    fn report(source_url: Option<&str>) -> CredibilityReport {
        CredibilityReport {
            source_url: source_url.map(str::to_string),
            overall_assessment: "Fine.".to_string(),
            claim_verdicts: vec![],
            overall_rating: CredibilityRating::SomewhatCredible,
            recommendations: "Read widely.".to_string(),
            final_label: FinalLabel::Uncertain,
        }
    }

    #[test]
    fn test_report_slug() {
        assert_eq!(
            report_slug(&report(Some("https://www.bbc.co.uk/news/articles/c0ferry?at=1"))),
            "www-bbc-co-uk-news-articles-c0ferry-at-1"
        );
        assert_eq!(report_slug(&report(None)), "provided-text");
        let long = format!("https://news.test/{}", "a-".repeat(100));
        assert!(report_slug(&report(Some(&long))).chars().count() <= MAX_SLUG_CHARS);
    }

    #[tokio::test]
    async fn test_write_report_layout() {
        let dir = std::env::temp_dir().join(format!("fact-check-json-{}", std::process::id()));
        let dir = dir.to_string_lossy().to_string();
        let now = Local.with_ymd_and_hms(2025, 5, 6, 14, 23, 1).unwrap();

        let path = write_report_at(&report(None), &dir, now).await.unwrap();
        assert_eq!(path, format!("{dir}/2025-05-06/142301-provided-text.json"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["finalLabel"], "uncertain");
        assert!(written["checkedAt"].as_str().unwrap().starts_with("2025-05-06T14:23:01"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
