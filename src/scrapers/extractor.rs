//! Content extraction with primary-then-fallback semantics.

use super::fallback::FallbackScraper;
use super::{PageFetcher, PrimaryExtractor, PrimaryResponse};
use crate::config::Settings;
use crate::models::{ExtractionRequest, ExtractionResult, ExtractionSource};
use crate::utils::truncate_for_log;
use crate::validate::validate_url;
use tracing::{error, info, instrument, warn};

/// Extracts article text from a URL.
///
/// The primary API is tried first. Its answer is accepted only if the HTTP status
/// is 200, the API reports success, the trimmed content is longer than the
/// configured minimum, and no placeholder marker appears in it. Anything else,
/// including transport errors and a missing API key, sends the request to the
/// fallback scraper exactly once.
#[derive(Debug, Clone)]
pub struct ContentExtractor<P, F> {
    primary: P,
    fallback: FallbackScraper<F>,
    placeholder_markers: Vec<String>,
    min_content_chars: usize,
}

impl<P, F> ContentExtractor<P, F>
where
    P: PrimaryExtractor,
    F: PageFetcher,
{
    pub fn new(primary: P, fetcher: F, settings: &Settings) -> Self {
        Self {
            primary,
            fallback: FallbackScraper::new(fetcher, settings),
            placeholder_markers: settings.placeholder_markers.clone(),
            min_content_chars: settings.min_content_chars,
        }
    }

    /// Extract content for one request.
    ///
    /// The hosted API is tried first. Its answer is kept only when the status and
    /// success flag are good and the text is long enough and free of placeholder
    /// markers; otherwise the fallback scraper runs exactly once.
    ///
    /// # Arguments
    ///
    /// * `request` - The article URL to extract
    ///
    /// # Returns
    ///
    /// An [`ExtractionResult`]. Problems never raise; they come back with `is_error`
    /// set and a diagnostic in `content`.
    #[instrument(level = "info", skip_all, fields(url = %request.url))]
    pub async fn extract(&self, request: ExtractionRequest) -> ExtractionResult {
        let url = request.url;
        if let Err(e) = validate_url(&url) {
            return ExtractionResult::failure(e.to_string(), ExtractionSource::Primary);
        }

        match self.primary.scrape(&url).await {
            Ok(response) => match self.accept_primary(response) {
                Ok(content) => {
                    info!(
                        chars = content.chars().count(),
                        preview = %truncate_for_log(&content, 500),
                        "Primary extraction succeeded"
                    );
                    return ExtractionResult::success(content, ExtractionSource::Primary);
                }
                Err(reason) => warn!(%reason, "Primary extraction rejected; falling back"),
            },
            Err(e) => warn!(error = %e, "Primary extraction failed; falling back"),
        }

        let result = self.fallback.scrape(&url).await;
        if result.is_error {
            error!(detail = ?result.error_detail, "Fallback extraction failed");
        }
        result
    }

    /// Run only the fallback scraper against `url`.
    pub async fn fallback_scrape(&self, url: &str) -> ExtractionResult {
        self.fallback.scrape(url).await
    }

    fn accept_primary(&self, response: PrimaryResponse) -> Result<String, String> {
        if response.status != 200 {
            return Err(format!("API returned status code {}", response.status));
        }
        if !response.success {
            return Err(format!(
                "API reported failure: {}",
                response.error.as_deref().unwrap_or("Unknown error")
            ));
        }
        let content = response.content.unwrap_or_default();
        let trimmed = content.trim();
        if trimmed.chars().count() <= self.min_content_chars {
            return Err(format!("content too short ({} chars)", trimmed.chars().count()));
        }
        if let Some(marker) = self.placeholder_markers.iter().find(|m| trimmed.contains(m.as_str())) {
            return Err(format!("content contains placeholder marker {marker:?}"));
        }
        Ok(trimmed.to_string())
    }
}
