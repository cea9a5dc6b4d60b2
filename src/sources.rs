//! Source classification by domain.
//!
//! [`SourceClassifier`] answers two questions about a URL (or a bare domain):
//! whether it belongs to a trusted outlet that receives the credibility bias, and
//! how reliable a search result from it should be considered.

use crate::config::Settings;
use crate::models::Reliability;
use url::Url;

#[derive(Debug, Clone)]
pub struct SourceClassifier {
    trusted: Vec<String>,
    high: Vec<String>,
    medium: Vec<String>,
    low: Vec<String>,
    placeholder: Vec<String>,
}

impl SourceClassifier {
    pub fn from_settings(settings: &Settings) -> Self {
        let normalize = |domains: &[String]| -> Vec<String> {
            domains
                .iter()
                .map(|d| d.trim().trim_start_matches('.').to_lowercase())
                .filter(|d| !d.is_empty())
                .collect()
        };
        Self {
            trusted: normalize(&settings.trusted_domains),
            high: normalize(&settings.high_reliability_domains),
            medium: normalize(&settings.medium_reliability_domains),
            low: normalize(&settings.low_reliability_domains),
            placeholder: normalize(&settings.placeholder_domains),
        }
    }

    /// True when the URL or domain belongs to a trusted outlet.
    pub fn is_trusted(&self, url_or_domain: &str) -> bool {
        host_of(url_or_domain).is_some_and(|host| matches_any(&host, &self.trusted))
    }

    /// True when the URL or domain is a known placeholder site.
    pub fn is_placeholder(&self, url_or_domain: &str) -> bool {
        host_of(url_or_domain).is_some_and(|host| matches_any(&host, &self.placeholder))
    }

    /// Reliability annotation for a search result from this URL.
    pub fn reliability(&self, url_or_domain: &str) -> Reliability {
        let Some(host) = host_of(url_or_domain) else {
            return Reliability::Unknown;
        };
        if matches_any(&host, &self.trusted) || matches_any(&host, &self.high) {
            Reliability::High
        } else if matches_any(&host, &self.medium) {
            Reliability::Medium
        } else if matches_any(&host, &self.low) {
            Reliability::Low
        } else {
            Reliability::Unknown
        }
    }
}

impl Default for SourceClassifier {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Lowercased host of a URL, or the input itself when it is a bare domain.
/// A leading `www.` is dropped.
pub fn host_of(url_or_domain: &str) -> Option<String> {
    let trimmed = url_or_domain.trim();
    if trimmed.is_empty() {
        return None;
    }
    let host = match Url::parse(trimmed) {
        Ok(parsed) => parsed.host_str()?.to_lowercase(),
        Err(_) => {
            let bare = trimmed.split(['/', '?', '#']).next().unwrap_or_default();
            if bare.contains(char::is_whitespace) || !bare.contains('.') {
                return None;
            }
            bare.to_lowercase()
        }
    };
    Some(host.trim_start_matches("www.").to_string())
}

/// Outlet name of a host: the label just before the public suffix.
///
/// `www.bbc.co.uk` and `bbc.com` both give `bbc`, so two hosts with the same tag
/// are treated as the same outlet.
pub fn site_tag(url_or_domain: &str) -> Option<String> {
    let host = host_of(url_or_domain)?;
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    let n = labels.len();
    let tag = match n {
        0 => return None,
        1 => labels[0],
        2 => labels[0],
        _ if labels[n - 1].len() == 2 && labels[n - 2].len() <= 3 => labels[n - 3],
        _ => labels[n - 2],
    };
    Some(tag.to_string())
}

fn matches_any(host: &str, domains: &[String]) -> bool {
    domains
        .iter()
        .any(|d| host == d || host.ends_with(&format!(".{d}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trusted_bbc_urls() {
        let classifier = SourceClassifier::default();
        assert!(classifier.is_trusted("https://www.bbc.com/news/world-europe-68736364"));
        assert!(classifier.is_trusted("https://bbc.co.uk/news/uk-1"));
        assert!(classifier.is_trusted("news.bbc.co.uk"));
        assert!(!classifier.is_trusted("https://notbbc.com/news"));
        assert!(!classifier.is_trusted("https://bbc.com.evil.test/news"));
        assert!(!classifier.is_trusted("not-a-url"));
        assert!(!classifier.is_trusted(""));
    }

    #[test]
    fn test_reliability_tiers() {
        let classifier = SourceClassifier::default();
        assert_eq!(classifier.reliability("https://www.reuters.com/world/x"), Reliability::High);
        assert_eq!(classifier.reliability("https://www.cdc.gov/flu"), Reliability::High);
        assert_eq!(classifier.reliability("https://en.wikipedia.org/wiki/X"), Reliability::Medium);
        assert_eq!(classifier.reliability("https://www.reddit.com/r/news"), Reliability::Low);
        assert_eq!(classifier.reliability("https://some-blog.test/post"), Reliability::Unknown);
    }

    #[test]
    fn test_placeholder_detection() {
        let classifier = SourceClassifier::default();
        assert!(classifier.is_placeholder("https://example.com/"));
        assert!(classifier.is_placeholder("https://www.example.org/whatever"));
        assert!(!classifier.is_placeholder("https://example.co.uk/"));
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://WWW.BBC.com/news"), Some("bbc.com".to_string()));
        assert_eq!(host_of("bbc.co.uk/news"), Some("bbc.co.uk".to_string()));
        assert_eq!(host_of("hello world"), None);
    }

    #[test]
    fn test_site_tag_groups_outlet_domains() {
        assert_eq!(site_tag("https://www.bbc.co.uk/news/1").as_deref(), Some("bbc"));
        assert_eq!(site_tag("https://feeds.bbc.com/x").as_deref(), Some("bbc"));
        assert_eq!(site_tag("https://www.reuters.com/world").as_deref(), Some("reuters"));
        assert_eq!(site_tag("https://www.abc.net.au/news").as_deref(), Some("abc"));
        assert_eq!(site_tag("not a url"), None);
    }
}
