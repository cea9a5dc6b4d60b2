//! DuckDuckGo HTML search scraper.
//!
//! Uses the no-JavaScript endpoint (`html.duckduckgo.com/html/`), whose result
//! markup is small and stable. Result links point at a `/l/?uddg=` redirect; the
//! destination URL is decoded from the `uddg` parameter.

use super::{SearchHit, SearchProvider};
use crate::config::Settings;
use crate::error::FetchError;
use crate::scrapers::strategies::element_text;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

static RESULT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".result").expect("RESULT selector should parse"));
static TITLE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.result__a").expect("TITLE_LINK selector should parse"));
static SNIPPET: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".result__snippet").expect("SNIPPET selector should parse"));
static DDG_BASE: Lazy<Url> =
    Lazy::new(|| Url::parse("https://duckduckgo.com").expect("DDG_BASE should parse"));

#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
    max_results: usize,
}

impl DuckDuckGoSearch {
    pub fn new(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            endpoint: settings.search_endpoint.clone(),
            max_results: settings.max_search_results,
        }
    }
}

impl SearchProvider for DuckDuckGoSearch {
    #[instrument(level = "info", skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, FetchError> {
        let url = format!("{}?q={}", self.endpoint, urlencoding::encode(query));
        let response = self.client.get(&url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        if status != 200 {
            return Err(FetchError::Status {
                status,
                body: crate::utils::truncate_for_log(&body, 200),
            });
        }

        let hits = parse_results(&body, self.max_results);
        info!(count = hits.len(), "Search returned results");
        debug!(hits = ?hits, "Search hits");
        Ok(hits)
    }
}

/// Parse a DuckDuckGo HTML results page, skipping ads.
pub fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    document
        .select(&RESULT)
        .filter(|result| {
            !result
                .value()
                .attr("class")
                .is_some_and(|c| c.contains("result--ad"))
        })
        .filter_map(|result| {
            let link = result.select(&TITLE_LINK).next()?;
            let url = resolve_link(link.value().attr("href")?)?;
            let snippet = result
                .select(&SNIPPET)
                .next()
                .map(element_text)
                .unwrap_or_default();
            Some(SearchHit {
                title: element_text(link),
                url,
                snippet,
            })
        })
        .take(max_results)
        .collect()
}

/// Turn a result href into the destination URL.
fn resolve_link(href: &str) -> Option<String> {
    let joined = DDG_BASE.join(href).ok()?;
    let is_redirect = joined
        .host_str()
        .is_some_and(|h| h.ends_with("duckduckgo.com"))
        && joined.path() == "/l/";
    if is_redirect {
        return joined
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned());
    }
    Some(joined.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
<html><body>
<div class="result results_links result--ad">
  <a class="result__a" href="https://ads.test/buy">Buy now</a>
  <a class="result__snippet">Sponsored</a>
</div>
<div class="result results_links results_links_deep web-result">
  <h2 class="result__title">
    <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.reuters.com%2Fworld%2Fbridge%3Fa%3D1&amp;rut=abc">Bridge <b>reopens</b></a>
  </h2>
  <a class="result__snippet" href="#">The bridge <b>reopened</b> on Monday after repairs.</a>
</div>
<div class="result results_links web-result">
  <a class="result__a" href="https://en.wikipedia.org/wiki/Tay_Road_Bridge">Tay Road Bridge - Wikipedia</a>
</div>
</body></html>"##;

    #[test]
    fn test_parse_results_decodes_redirects_and_skips_ads() {
        let hits = parse_results(PAGE, 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://www.reuters.com/world/bridge?a=1");
        assert_eq!(hits[0].title, "Bridge reopens");
        assert_eq!(hits[0].snippet, "The bridge reopened on Monday after repairs.");
        assert_eq!(hits[1].url, "https://en.wikipedia.org/wiki/Tay_Road_Bridge");
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn test_parse_results_respects_limit() {
        assert_eq!(parse_results(PAGE, 1).len(), 1);
    }

    #[test]
    fn test_parse_results_empty_page() {
        assert!(parse_results("<html><body>No results.</body></html>", 5).is_empty());
    }
}
