//! Primary extraction through a Firecrawl-compatible scrape API.
//!
//! The API renders the page (waiting for client-side content) and returns it as
//! markdown and HTML. Quality checks on the returned content live in
//! [`super::extractor`]; this module only speaks the wire format.

use super::{PrimaryExtractor, PrimaryResponse};
use crate::config::Settings;
use crate::error::FetchError;
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'static str; 2],
    wait_for: u64,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    markdown: Option<String>,
    html: Option<String>,
}

/// Client for the primary extraction API.
#[derive(Clone)]
pub struct FirecrawlClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    wait_for_ms: u64,
}

impl std::fmt::Debug for FirecrawlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirecrawlClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_deref().map(redact_key))
            .field("wait_for_ms", &self.wait_for_ms)
            .finish()
    }
}

impl FirecrawlClient {
    pub fn new(client: Client, settings: &Settings, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: settings.primary_endpoint.clone(),
            api_key: api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()),
            wait_for_ms: settings.primary_wait_for_ms,
        }
    }
}

impl PrimaryExtractor for FirecrawlClient {
    #[instrument(level = "info", skip(self))]
    async fn scrape(&self, url: &str) -> Result<PrimaryResponse, FetchError> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("Primary extraction API key not configured");
            return Err(FetchError::MissingApiKey);
        };

        let payload = ScrapeRequest {
            url,
            formats: ["markdown", "html"],
            wait_for: self.wait_for_ms,
        };
        info!(
            endpoint = %self.endpoint,
            api_key = %redact_key(api_key),
            wait_for_ms = self.wait_for_ms,
            "Sending primary extraction request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        info!(status, bytes = body.len(), "Primary extraction API responded");
        debug!(body = %truncate_for_log(&body, 500), "Primary extraction response body");

        parse_scrape_response(status, &body)
    }
}

/// Map a raw API response onto [`PrimaryResponse`].
///
/// Non-200 statuses are not errors here: they come back with `success = false` so
/// the extractor decides what to do with them.
pub fn parse_scrape_response(status: u16, body: &str) -> Result<PrimaryResponse, FetchError> {
    if status != 200 {
        return Ok(PrimaryResponse {
            status,
            success: false,
            content: None,
            error: Some(truncate_for_log(body, 300)),
        });
    }

    let parsed: ScrapeResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;
    let content = parsed.data.and_then(|data| {
        data.markdown
            .filter(|md| !md.trim().is_empty())
            .or(data.html)
    });

    Ok(PrimaryResponse {
        status,
        success: parsed.success,
        content,
        error: parsed.error,
    })
}

/// Show only the first five characters of an API key.
pub fn redact_key(key: &str) -> String {
    let prefix: String = key.chars().take(5).collect();
    format!("{prefix}...")
}
