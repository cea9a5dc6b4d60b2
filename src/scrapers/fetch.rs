//! Direct page fetching with browser-like headers.

use super::{FetchedPage, PageFetcher};
use crate::config::Settings;
use crate::error::FetchError;
use crate::utils::truncate_for_log;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{redirect, Client};
use tracing::{debug, info, instrument};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
        ),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers
}

/// Build the HTTP client shared by every network seam.
///
/// Browser-like headers, the configured timeout, and up to ten redirects.
/// Content encodings are negotiated by reqwest itself.
pub fn build_http_client(settings: &Settings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(browser_headers())
        .timeout(settings.request_timeout())
        .redirect(redirect::Policy::limited(10))
        .build()
}

/// [`PageFetcher`] over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl PageFetcher for HttpPageFetcher {
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await?;

        info!(status, %final_url, bytes = body.len(), "Fetched page");
        debug!(preview = %truncate_for_log(&body, 500), "Page body");
        Ok(FetchedPage {
            status,
            final_url,
            body,
        })
    }
}
