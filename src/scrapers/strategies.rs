//! Ordered HTML extraction strategies for the fallback scraper.
//!
//! Each strategy is a pure function from a parsed document to candidate text
//! blocks. [`run_strategies`] tries them in [`STRATEGIES`] order and stops at the
//! first one that yields anything:
//!
//! | # | Strategy | Looks at |
//! |---|----------|----------|
//! | 1 | `site_specific` | outlet selectors (see [`super::bbc`]) |
//! | 2 | `content_container` | `main`, `article`, content-class containers |
//! | 3 | `all_paragraphs` | every `<p>` on the page, long ones only |
//! | 4 | `body_text` | the whole body, boilerplate sentences stripped |

use super::bbc;
use crate::utils::{normalize_whitespace, truncate_chars};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, info};

/// Minimum paragraph length inside a recognized content container.
const MIN_CONTAINER_PARAGRAPH_CHARS: usize = 30;
/// Minimum paragraph length when scanning the whole page.
const MIN_SITEWIDE_PARAGRAPH_CHARS: usize = 50;

static CONTAINER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("main, article, .content, #content, .article-content, .post-content")
        .expect("CONTAINER_SELECTOR should parse")
});
static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("PARAGRAPH_SELECTOR should parse"));
static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("BODY_SELECTOR should parse"));
static NOISE_SENTENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(Share this|Follow us|Subscribe|Cookie|Newsletter).*?(\.|$)")
        .expect("NOISE_SENTENCE should compile")
});

const NOISE_PHRASES: [&str; 4] = ["cookie", "subscribe", "newsletter", "share this"];

/// What a strategy knows about the page besides its DOM.
#[derive(Debug, Clone)]
pub struct PageContext {
    /// Lowercased host without `www.`, if the URL parsed.
    pub host: Option<String>,
    /// Cap on the whole-body text, in characters.
    pub body_text_limit: usize,
}

pub type StrategyFn = fn(&Html, &PageContext) -> Vec<String>;

#[derive(Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub run: StrategyFn,
}

pub const STRATEGIES: [Strategy; 4] = [
    Strategy {
        name: "site_specific",
        run: site_specific,
    },
    Strategy {
        name: "content_container",
        run: content_container,
    },
    Strategy {
        name: "all_paragraphs",
        run: all_paragraphs,
    },
    Strategy {
        name: "body_text",
        run: body_text,
    },
];

/// Run [`STRATEGIES`] in order and return the first non-empty result along with
/// the name of the strategy that produced it.
pub fn run_strategies(document: &Html, ctx: &PageContext) -> Option<(&'static str, Vec<String>)> {
    for strategy in STRATEGIES {
        let blocks: Vec<String> = (strategy.run)(document, ctx)
            .into_iter()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .unique()
            .collect();
        if blocks.is_empty() {
            debug!(strategy = strategy.name, "Strategy yielded nothing");
            continue;
        }
        info!(strategy = strategy.name, blocks = blocks.len(), "Strategy yielded content");
        return Some((strategy.name, blocks));
    }
    None
}

/// Outlet-specific selectors, when the host has a profile.
pub fn site_specific(document: &Html, ctx: &PageContext) -> Vec<String> {
    match ctx.host.as_deref() {
        Some(host) if bbc::handles(host) => {
            info!(%host, "Using BBC-specific extraction");
            bbc::extract(document)
        }
        _ => Vec::new(),
    }
}

/// Paragraphs of the first recognized content container that has any.
pub fn content_container(document: &Html, _ctx: &PageContext) -> Vec<String> {
    for container in document.select(&CONTAINER_SELECTOR) {
        let paragraphs: Vec<String> = container
            .select(&PARAGRAPH_SELECTOR)
            .map(element_text)
            .filter(|t| t.chars().count() > MIN_CONTAINER_PARAGRAPH_CHARS)
            .collect();
        debug!(
            container = container.value().name(),
            paragraphs = paragraphs.len(),
            "Checked content container"
        );
        if !paragraphs.is_empty() {
            return paragraphs;
        }
    }
    Vec::new()
}

/// Every long, non-boilerplate paragraph on the page.
pub fn all_paragraphs(document: &Html, _ctx: &PageContext) -> Vec<String> {
    document
        .select(&PARAGRAPH_SELECTOR)
        .map(element_text)
        .filter(|t| t.chars().count() > MIN_SITEWIDE_PARAGRAPH_CHARS && !is_noise(t))
        .collect()
}

/// Visible body text with boilerplate sentences removed, capped in length.
pub fn body_text(document: &Html, ctx: &PageContext) -> Vec<String> {
    let raw = match document.select(&BODY_SELECTOR).next() {
        Some(body) => visible_text(body),
        None => visible_text(document.root_element()),
    };
    let text = normalize_whitespace(&raw);
    let stripped = normalize_whitespace(&NOISE_SENTENCE.replace_all(&text, ""));
    if stripped.is_empty() {
        return Vec::new();
    }
    vec![truncate_chars(&stripped, ctx.body_text_limit)]
}

/// Concatenated text of an element, whitespace-normalized.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Text of an element, skipping script, style and template contents.
pub(crate) fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript" | "template"))
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    out
}

/// True if the element or its immediate container carries one of the class fragments.
///
/// Outer page wrappers are not consulted, so a layout class such as `shared-layout`
/// several levels up cannot hide the article body.
pub(crate) fn has_class_fragment(element: ElementRef<'_>, fragments: &[&str]) -> bool {
    std::iter::once(element)
        .chain(element.parent().and_then(ElementRef::wrap))
        .filter_map(|e| e.value().attr("class"))
        .any(|class| {
            let class = class.to_lowercase();
            fragments.iter().any(|f| class.contains(f))
        })
}

pub(crate) fn is_noise(text: &str) -> bool {
    let lower = text.to_lowercase();
    NOISE_PHRASES.iter().any(|p| lower.contains(p))
}
