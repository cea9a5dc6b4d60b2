//! Pipeline settings loaded from an optional YAML file.
//!
//! Every field has a default, so a settings file only needs the values it wants to
//! change. The language-model configuration itself is not here: it lives in the
//! `awful_aj` `config.yaml` and is loaded separately in `main`.

use crate::agents::AgentRoster;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Timeout applied to every outbound HTTP call, in seconds.
    pub request_timeout_secs: u64,
    /// Primary extraction endpoint (Firecrawl-compatible `/v1/scrape`).
    pub primary_endpoint: String,
    /// How long the primary API should wait for the page to render, in milliseconds.
    pub primary_wait_for_ms: u64,
    /// DuckDuckGo HTML search endpoint.
    pub search_endpoint: String,
    /// Maximum number of hits kept per search query.
    pub max_search_results: usize,
    /// Domains whose content receives the trusted-source bias.
    pub trusted_domains: Vec<String>,
    /// Domains with a strong record of editorial standards (reliability `high`).
    pub high_reliability_domains: Vec<String>,
    /// Established outlets and references (reliability `medium`).
    pub medium_reliability_domains: Vec<String>,
    /// Social and user-generated platforms (reliability `low`).
    pub low_reliability_domains: Vec<String>,
    /// Landing on one of these after redirects means the scrape went wrong.
    pub placeholder_domains: Vec<String>,
    /// Text that marks a placeholder page rather than an article.
    pub placeholder_markers: Vec<String>,
    /// Extracted text at or below this many characters is rejected.
    pub min_content_chars: usize,
    /// Cap on the whole-body fallback text, in characters.
    pub body_text_limit: usize,
    /// Text recovered by the trusted-domain fallback scrape must be longer than this.
    pub trusted_recovery_min_chars: usize,
    /// Retry attempts for each language-model call.
    pub llm_max_retries: u32,
    /// Initial backoff between language-model retries, in milliseconds.
    pub llm_base_delay_ms: u64,
    pub agents: AgentRoster,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            primary_endpoint: "https://api.firecrawl.dev/v1/scrape".to_string(),
            primary_wait_for_ms: 10_000,
            search_endpoint: "https://html.duckduckgo.com/html/".to_string(),
            max_search_results: 5,
            trusted_domains: strings(&["bbc.com", "bbc.co.uk"]),
            high_reliability_domains: strings(&[
                "bbc.com", "bbc.co.uk", "reuters.com", "apnews.com", "npr.org", "who.int",
                "nature.com", "science.org", "gov", "edu",
            ]),
            medium_reliability_domains: strings(&[
                "wikipedia.org", "nytimes.com", "theguardian.com", "washingtonpost.com",
                "cnn.com", "aljazeera.com", "bloomberg.com", "ft.com", "economist.com",
                "politifact.com", "snopes.com", "factcheck.org",
            ]),
            low_reliability_domains: strings(&[
                "facebook.com", "twitter.com", "x.com", "reddit.com", "tiktok.com",
                "youtube.com", "medium.com", "blogspot.com", "substack.com", "quora.com",
            ]),
            placeholder_domains: strings(&["example.com", "example.org", "example.net"]),
            placeholder_markers: strings(&["Example Domain"]),
            min_content_chars: 100,
            body_text_limit: 8000,
            trusted_recovery_min_chars: 500,
            llm_max_retries: 2,
            llm_base_delay_ms: 1000,
            agents: AgentRoster::default(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn llm_base_delay(&self) -> Duration {
        Duration::from_millis(self.llm_base_delay_ms)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Load settings from `path`, or return the defaults when no path is given.
#[instrument(level = "info")]
pub async fn load_settings(path: Option<&str>) -> Result<Settings, Box<dyn Error>> {
    let Some(path) = path else {
        info!("No settings file given; using defaults");
        return Ok(Settings::default());
    };

    let raw = tokio::fs::read_to_string(path).await?;
    let settings: Settings = serde_yaml::from_str(&raw)?;
    info!(
        path,
        trusted_domains = ?settings.trusted_domains,
        timeout_secs = settings.request_timeout_secs,
        "Loaded pipeline settings"
    );
    Ok(settings)
}
