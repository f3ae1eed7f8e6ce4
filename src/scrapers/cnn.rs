//! CNN monthly sitemap crawler.
//!
//! CNN publishes one HTML sitemap per calendar month listing every article
//! of that month. This module walks one month or a whole year of them and
//! returns the filtered article URLs.
//!
//! # URL Pattern
//!
//! ```text
//! https://us.cnn.com/article/sitemap-{year}-{month}.html
//! ```
//!
//! The month is not zero-padded (`sitemap-2021-4.html`).

use crate::fetch::{FetchError, FetchPage};
use crate::links::{extract_links, filter_links};
use crate::models::{FailureLog, Period};
use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

/// Default sitemap host.
pub const DEFAULT_BASE_URL: &str = "https://us.cnn.com";

/// Why a sitemap could not be crawled.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
    #[error("could not build sitemap URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("failed to fetch sitemap {url}: {source}")]
    Fetch { url: String, source: FetchError },
}

/// Sitemap page for one month, below any path prefix of `base`.
pub fn sitemap_url(base: &Url, year: i32, month: u32) -> Result<Url, url::ParseError> {
    let mut root = base.clone();
    if !root.path().ends_with('/') {
        let path = format!("{}/", root.path());
        root.set_path(&path);
    }
    root.join(&format!("article/sitemap-{year}-{month}.html"))
}

/// Sequential crawler over the monthly sitemaps.
#[derive(Debug)]
pub struct SitemapCrawler<'a, F> {
    fetcher: &'a F,
    base_url: Url,
}

impl<'a, F> SitemapCrawler<'a, F>
where
    F: FetchPage,
{
    pub fn new(fetcher: &'a F, base_url: Url) -> Self {
        Self { fetcher, base_url }
    }

    /// Crawl a [`Period`]: one month, or the whole year.
    pub async fn crawl(
        &self,
        year: i32,
        period: Period,
        failures: &mut FailureLog,
    ) -> Result<Vec<String>, CrawlError> {
        match period {
            Period::All => Ok(self.crawl_year(year, failures).await),
            Period::Month(month) => self.crawl_month(year, month, failures).await,
        }
    }

    /// Filtered article URLs from one month's sitemap.
    ///
    /// A failed sitemap fetch is recorded in `failures` and returned as an error.
    #[instrument(level = "info", skip(self, failures))]
    pub async fn crawl_month(
        &self,
        year: i32,
        month: u32,
        failures: &mut FailureLog,
    ) -> Result<Vec<String>, CrawlError> {
        let links = filter_links(self.month_links(year, month, failures).await?);
        info!(count = links.len(), "Indexed CNN article URLs");
        Ok(links)
    }

    /// Filtered article URLs from all twelve sitemaps of a year.
    ///
    /// Months that fail are logged and skipped; whatever the other months
    /// yielded is returned.
    #[instrument(level = "info", skip(self, failures))]
    pub async fn crawl_year(&self, year: i32, failures: &mut FailureLog) -> Vec<String> {
        let mut all_links = Vec::new();
        let mut failed_months = 0usize;
        for month in 1..=12 {
            match self.month_links(year, month, failures).await {
                Ok(mut links) => all_links.append(&mut links),
                Err(e) => {
                    failed_months += 1;
                    warn!(month, error = %e, "Skipping sitemap month");
                }
            }
        }

        let links = filter_links(all_links);
        info!(
            count = links.len(),
            failed_months, "Indexed CNN article URLs for the year"
        );
        links
    }

    /// Raw, unfiltered links from one month's sitemap.
    async fn month_links(
        &self,
        year: i32,
        month: u32,
        failures: &mut FailureLog,
    ) -> Result<Vec<String>, CrawlError> {
        if !(1..=12).contains(&month) {
            return Err(CrawlError::InvalidMonth(month));
        }
        let url = sitemap_url(&self.base_url, year, month)?;
        match self.fetcher.fetch(url.as_str()).await {
            Ok(markup) => Ok(extract_links(&markup)),
            Err(source) => {
                failures.record(url.as_str());
                Err(CrawlError::Fetch {
                    url: url.into(),
                    source,
                })
            }
        }
    }
}
