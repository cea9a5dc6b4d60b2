//! BBC News article extraction.
//!
//! BBC pages change class names frequently (the `ssrcss-*` classes are generated),
//! so several generations of selectors are tried side by side. The result is a
//! markdown-ish block list: `# headline`, body paragraphs, then `*byline*` lines.
//!
//! A page with a headline but no body paragraphs yields nothing, so the generic
//! strategies get a chance at it.

use super::strategies::{element_text, has_class_fragment};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

const HOSTS: [&str; 2] = ["bbc.com", "bbc.co.uk"];

const HEADLINE_SELECTORS: [&str; 5] = [
    "h1",
    "[data-component=\"headline\"]",
    ".article-headline",
    ".story-body__h1",
    ".ssrcss-15xko80-StyledHeading",
];

const CONTAINER_SELECTORS: &str = "article, \
    [data-component=\"text-block\"], \
    .ssrcss-1q0x1qg-RichTextContainer, \
    .story-body__inner, \
    div[data-component=\"text\"], \
    div[class*=\"RichText\"], \
    .ssrcss-uf6wea-RichTextContainer, \
    .ssrcss-7uxr49-RichTextContainer, \
    .article__body-content, \
    .story-body, \
    .body-content-container, \
    .article-body-content";

const METADATA_SELECTORS: &str = ".ssrcss-17m4u3h-MetadataStrip, \
    .ssrcss-f4vpt6-MetadataLink, \
    .ssrcss-1n2rzdv-StyledPublishingContext, \
    .article-info, \
    .author-unit__content, \
    .byline, \
    .article-meta, \
    .article__author, \
    .article__timestamp, \
    [data-component=\"byline\"], \
    [data-component=\"meta\"], \
    [data-component=\"topics\"]";

const SKIPPED_CLASSES: [&str; 4] = ["navigation", "social", "share", "hidden"];
const METADATA_NOISE: [&str; 3] = ["share this", "follow us", "subscribe"];
const MIN_PARAGRAPH_CHARS: usize = 10;

static HEADLINES: Lazy<Vec<Selector>> = Lazy::new(|| {
    HEADLINE_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("BBC headline selector should parse"))
        .collect()
});
static CONTAINERS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(CONTAINER_SELECTORS).expect("BBC container selector should parse"));
static PARAGRAPHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, .paragraph").expect("BBC paragraph selector should parse"));
static METADATA: Lazy<Selector> =
    Lazy::new(|| Selector::parse(METADATA_SELECTORS).expect("BBC metadata selector should parse"));

/// True for BBC hosts and their subdomains.
pub fn handles(host: &str) -> bool {
    HOSTS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}

/// Extract headline, body paragraphs and byline metadata from a BBC article.
pub fn extract(document: &Html) -> Vec<String> {
    let mut blocks = Vec::new();

    let headline = HEADLINES.iter().zip(HEADLINE_SELECTORS).find_map(|(selector, raw)| {
        let text = element_text(document.select(selector).next()?);
        (!text.is_empty()).then(|| {
            debug!(selector = raw, %text, "Found BBC headline");
            text
        })
    });
    match headline {
        Some(text) => blocks.push(format!("# {text}")),
        None => warn!("Could not find BBC headline using any selector"),
    }

    let paragraphs: Vec<String> = document
        .select(&CONTAINERS)
        .flat_map(|container| container.select(&PARAGRAPHS))
        .filter(|p| !has_class_fragment(*p, &SKIPPED_CLASSES))
        .map(element_text)
        .filter(|t| t.chars().count() > MIN_PARAGRAPH_CHARS && !t.starts_with("Share this"))
        .collect();
    info!(paragraphs = paragraphs.len(), "Extracted BBC body paragraphs");
    if paragraphs.is_empty() {
        return Vec::new();
    }
    blocks.extend(paragraphs);

    let metadata = document
        .select(&METADATA)
        .map(element_text)
        .filter(|t| {
            let lower = t.to_lowercase();
            !t.is_empty() && !METADATA_NOISE.iter().any(|n| lower.contains(n))
        })
        .map(|t| format!("*{t}*"));
    blocks.extend(metadata);

    blocks
}
