//! Rules-based fallback scraper.
//!
//! Fetches the page directly and runs the ordered strategies from
//! [`super::strategies`] over it. Every failure comes back as an error
//! [`ExtractionResult`] carrying a readable diagnostic; nothing is raised.

use super::strategies::{run_strategies, PageContext};
use super::PageFetcher;
use crate::config::Settings;
use crate::models::{ExtractionResult, ExtractionSource};
use crate::sources::{host_of, SourceClassifier};
use crate::utils::truncate_for_log;
use scraper::Html;
use tracing::{error, info, instrument};

#[derive(Debug, Clone)]
pub struct FallbackScraper<F> {
    fetcher: F,
    classifier: SourceClassifier,
    min_content_chars: usize,
    body_text_limit: usize,
}

impl<F: PageFetcher> FallbackScraper<F> {
    pub fn new(fetcher: F, settings: &Settings) -> Self {
        Self {
            fetcher,
            classifier: SourceClassifier::from_settings(settings),
            min_content_chars: settings.min_content_chars,
            body_text_limit: settings.body_text_limit,
        }
    }

    #[cfg(test)]
    pub(crate) fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch `url` and extract readable text from it.
    ///
    /// # Arguments
    ///
    /// * `url` - Page to fetch directly, without the hosted API
    ///
    /// # Returns
    ///
    /// The text of the first strategy that produced anything, or an error
    /// [`ExtractionResult`] for a bad status, a placeholder redirect, or too little text.
    #[instrument(level = "info", skip(self))]
    pub async fn scrape(&self, url: &str) -> ExtractionResult {
        info!("Starting direct scrape");
        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                let detail = format!("Error scraping URL {url}: {e}");
                error!(error = %e, "Direct fetch failed");
                return ExtractionResult::failure(detail, ExtractionSource::Fallback);
            }
        };

        if page.status != 200 {
            let detail = format!("Error: Failed to retrieve content. Status code: {}", page.status);
            error!(status = page.status, "Direct fetch returned non-200");
            return ExtractionResult::failure(detail, ExtractionSource::Fallback);
        }

        if self.classifier.is_placeholder(&page.final_url) {
            let landed = host_of(&page.final_url).unwrap_or_else(|| page.final_url.clone());
            error!(final_url = %page.final_url, "Redirected to a placeholder domain");
            return ExtractionResult::failure(
                format!("Error: Redirected to {landed} while scraping {url}."),
                ExtractionSource::Fallback,
            );
        }

        let text = extract_text(&page.body, url, self.body_text_limit).unwrap_or_default();
        let chars = text.chars().count();
        info!(
            chars,
            sample = %truncate_for_log(&text, 500),
            "Extracted fallback content"
        );

        if chars < self.min_content_chars {
            let detail = format!("Error: Could not extract meaningful content from {url}.");
            error!(chars, min = self.min_content_chars, "Fallback content too short");
            return ExtractionResult::failure(detail, ExtractionSource::Fallback);
        }

        ExtractionResult::success(text, ExtractionSource::Fallback)
    }
}

/// Parse `html` and run the strategy cascade, joining blocks with blank lines.
pub fn extract_text(html: &str, url: &str, body_text_limit: usize) -> Option<String> {
    let document = Html::parse_document(html);
    let ctx = PageContext {
        host: host_of(url),
        body_text_limit,
    };
    let (strategy, blocks) = run_strategies(&document, &ctx)?;
    info!(strategy, blocks = blocks.len(), "Fallback strategy selected");
    Some(blocks.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::scrapers::FetchedPage;

    struct StaticPage(Result<FetchedPage, u16>);

    impl PageFetcher for StaticPage {
        async fn fetch(&self, _url: &str) -> Result<FetchedPage, FetchError> {
            match &self.0 {
                Ok(page) => Ok(page.clone()),
                Err(status) => Err(FetchError::Status {
                    status: *status,
                    body: "unreachable".to_string(),
                }),
            }
        }
    }

    fn page(status: u16, final_url: &str, body: &str) -> StaticPage {
        StaticPage(Ok(FetchedPage {
            status,
            final_url: final_url.to_string(),
            body: body.to_string(),
        }))
    }

    fn scraper(fetcher: StaticPage) -> FallbackScraper<StaticPage> {
        FallbackScraper::new(fetcher, &Settings::default())
    }

    const ARTICLE: &str = "<html><body><article>\
        <p>The harbour authority confirmed that the new ferry terminal opened to passengers on Friday morning.</p>\
        <p>Around 2,000 travellers used the terminal during its first day of operation, officials said.</p>\
        </article></body></html>";

    #[tokio::test]
    async fn test_successful_scrape() {
        let result = scraper(page(200, "https://news.test/ferry", ARTICLE))
            .scrape("https://news.test/ferry")
            .await;
        assert!(!result.is_error);
        assert_eq!(result.source, ExtractionSource::Fallback);
        assert!(result.content.contains("new ferry terminal"));
        assert!(result.content.contains("\n\nAround 2,000 travellers"));
    }

    #[tokio::test]
    async fn test_non_200_is_error() {
        let result = scraper(page(403, "https://news.test/ferry", ARTICLE))
            .scrape("https://news.test/ferry")
            .await;
        assert!(result.is_error);
        assert_eq!(result.content, "Error: Failed to retrieve content. Status code: 403");
    }

    #[tokio::test]
    async fn test_placeholder_redirect_is_error() {
        let result = scraper(page(200, "https://example.com/", ARTICLE))
            .scrape("https://news.test/ferry")
            .await;
        assert!(result.is_error);
        assert_eq!(
            result.error_detail.as_deref(),
            Some("Error: Redirected to example.com while scraping https://news.test/ferry.")
        );
    }

    #[tokio::test]
    async fn test_thin_page_is_error() {
        let result = scraper(page(200, "https://news.test/x", "<html><body><p>Hi</p></body></html>"))
            .scrape("https://news.test/x")
            .await;
        assert!(result.is_error);
        assert!(result.content.contains("Could not extract meaningful content"));
    }

    #[tokio::test]
    async fn test_transport_error_is_error_result() {
        let result = scraper(StaticPage(Err(502))).scrape("https://news.test/x").await;
        assert!(result.is_error);
        assert!(result.content.starts_with("Error scraping URL https://news.test/x"));
    }

    #[tokio::test]
    async fn test_scrape_is_idempotent_for_unchanged_page() {
        let s = scraper(page(200, "https://news.test/ferry", ARTICLE));
        let first = s.scrape("https://news.test/ferry").await;
        let second = s.scrape("https://news.test/ferry").await;
        assert_eq!(first, second);
    }
}
