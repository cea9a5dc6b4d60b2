//! Web content extraction and search scraping.
//!
//! Extraction runs in two tiers:
//!
//! 1. **Primary**: a hosted scraping API that renders the page and returns
//!    markdown ([`firecrawl`]).
//! 2. **Fallback**: a direct fetch with browser-like headers ([`fetch`]) followed by
//!    an ordered list of HTML heuristics ([`strategies`], with outlet-specific
//!    selectors in [`bbc`]), driven by [`fallback`].
//!
//! [`extractor`] ties the two together. [`duckduckgo`] scrapes search results for
//! the claim researcher.
//!
//! # Seams
//!
//! | Trait | Production impl | Used by |
//! |-------|-----------------|---------|
//! | [`PrimaryExtractor`] | [`firecrawl::FirecrawlClient`] | [`extractor::ContentExtractor`] |
//! | [`PageFetcher`] | [`fetch::HttpPageFetcher`] | [`fallback::FallbackScraper`] |
//! | [`SearchProvider`] | [`duckduckgo::DuckDuckGoSearch`] | the research stage |
//!
//! Implementations hold only immutable state (a `reqwest::Client` and settings),
//! so one instance can serve concurrent fact-checks.

pub mod bbc;
pub mod duckduckgo;
pub mod extractor;
pub mod fallback;
pub mod fetch;
pub mod firecrawl;
pub mod strategies;

use crate::error::FetchError;

/// Response of the primary extraction API, before quality checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryResponse {
    pub status: u16,
    /// The API-level success flag.
    pub success: bool,
    /// Markdown if present, otherwise HTML.
    pub content: Option<String>,
    pub error: Option<String>,
}

/// A page fetched directly, after redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub final_url: String,
    pub body: String,
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// A hosted extraction service that renders a page and returns its text.
pub trait PrimaryExtractor {
    async fn scrape(&self, url: &str) -> Result<PrimaryResponse, FetchError>;
}

/// Fetches raw HTML for the fallback scraper.
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Runs one web search query.
pub trait SearchProvider {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, FetchError>;
}
