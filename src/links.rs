//! Article link discovery and topic filtering for sitemap pages.
//!
//! Sitemap pages list every article of a month as plain anchors. An anchor
//! counts as an article link when its `href` contains a `/YYYY/MM/DD/` date
//! path. Hrefs are returned verbatim, relative or absolute, exactly as the
//! sitemap lists them.

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use scraper::{Html, Selector};
use crate::models::FailureLog;
use tracing::{debug, warn};
use url::Url;

static DATE_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d{4}/\d{2}/\d{2}/").unwrap());

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Topic segments whose pages are roundups, listicles or shopping content
/// rather than articles with extractable body text.
pub const EXCLUDED_PATTERNS: [&str; 6] = [
    "cnn-underscored",
    "fast-facts",
    "five-things",
    "-trnd",
    "what-matters",
    "week-in-review",
];

static EXCLUSIONS: Lazy<RegexSet> = Lazy::new(|| RegexSet::new(EXCLUDED_PATTERNS).unwrap());

/// Whether a URL has the `/YYYY/MM/DD/` shape of an article page.
pub fn is_article_url(url: &str) -> bool {
    DATE_PATH.is_match(url)
}

/// Extract every article link from sitemap markup, in document order.
///
/// Duplicates are kept.
pub fn extract_links(markup: &str) -> Vec<String> {
    let document = Html::parse_document(markup);
    let links: Vec<String> = document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| is_article_url(href))
        .map(str::to_string)
        .collect();
    debug!(count = links.len(), "Extracted article links");
    links
}

/// Whether a URL belongs to one of the [`EXCLUDED_PATTERNS`] topics.
pub fn is_excluded(url: &str) -> bool {
    EXCLUSIONS.is_match(url)
}

/// Drop URLs in excluded topics; everything else passes through untouched.
pub fn filter_links(urls: Vec<String>) -> Vec<String> {
    let before = urls.len();
    let kept: Vec<String> = urls.into_iter().filter(|u| !is_excluded(u)).collect();
    debug!(before, after = kept.len(), "Filtered excluded topics");
    kept
}

/// Turn sitemap hrefs into fetchable absolute URLs.
///
/// Absolute hrefs pass through; relative ones are joined onto `base`. Hrefs
/// that cannot be joined are recorded in `failures` verbatim and dropped.
pub fn resolve_links(base: &Url, hrefs: Vec<String>, failures: &mut FailureLog) -> Vec<String> {
    let mut resolved = Vec::with_capacity(hrefs.len());
    for href in hrefs {
        match base.join(&href) {
            Ok(url) => resolved.push(url.into()),
            Err(e) => {
                warn!(%href, error = %e, "Dropping unresolvable link");
                failures.record(href);
            }
        }
    }
    resolved
}
