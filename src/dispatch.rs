//! Bounded-concurrency fetch → parse → extract pipeline over article URLs.
//!
//! Each URL is one unit of work. Up to [`MAX_WORKERS`] units are in flight at
//! once: fetches run as concurrent futures, and parsing plus extraction run on
//! the blocking thread pool with the page body moved in. A unit shares nothing
//! with its siblings and hands back a self-contained [`UnitOutcome`].
//!
//! Only the coordinating loop in [`Dispatcher::run`] touches the output
//! records, the [`FailureLog`] and the timing accumulators, appending as each
//! outcome arrives.

use crate::extract::{extract, ExtractedArticle};
use crate::fetch::{FetchError, FetchPage};
use crate::models::{ArticleRecord, FailureLog, FieldSelection};
use crate::timing::{StageTimings, TimingSample};
use futures::stream::{self, StreamExt};
use scraper::Html;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Maximum number of units of work in flight.
pub const MAX_WORKERS: usize = 32;

/// Blocking parse + extract stage: article plus parse and extract durations.
type Analyzer = fn(&str) -> (ExtractedArticle, Duration, Duration);

/// What a single unit of work produced.
#[derive(Debug)]
pub enum UnitOutcome {
    /// Fetched and extracted; may still have an empty body.
    Extracted {
        url: String,
        article: ExtractedArticle,
        timing: TimingSample,
    },
    /// The fetch failed after retries.
    FetchFailed { url: String, error: FetchError },
    /// A later stage blew up; the article is skipped.
    Skipped { url: String, reason: String },
}

/// Everything a dispatch run produced.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub records: Vec<ArticleRecord>,
    pub timings: StageTimings,
    /// Pages fetched fine but without body paragraphs.
    pub empty: usize,
    /// Units that failed after the fetch stage.
    pub skipped: usize,
    /// Units whose fetch failed; their URLs went to the failure log.
    pub fetch_failed: usize,
}

/// Runs the article pipeline over a list of URLs.
#[derive(Debug)]
pub struct Dispatcher<'a, F> {
    fetcher: &'a F,
    concurrency: usize,
    fields: FieldSelection,
    analyze: Analyzer,
}

impl<'a, F> Dispatcher<'a, F>
where
    F: FetchPage,
{
    pub fn new(fetcher: &'a F, fields: FieldSelection) -> Self {
        Self {
            fetcher,
            concurrency: MAX_WORKERS,
            fields,
            analyze: parse_and_extract,
        }
    }

    /// Override the number of units in flight (at least one).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[cfg(test)]
    fn with_analyzer(mut self, analyze: Analyzer) -> Self {
        self.analyze = analyze;
        self
    }

    /// Process every URL and collect the results.
    ///
    /// Never fails as a whole: per-URL problems are logged, counted, and fetch
    /// failures recorded in `failures`.
    #[instrument(level = "info", skip_all, fields(urls = urls.len(), concurrency = self.concurrency))]
    pub async fn run(&self, urls: Vec<String>, failures: &mut FailureLog) -> DispatchReport {
        let total = urls.len();
        let mut report = DispatchReport::default();

        let mut units = stream::iter(urls)
            .map(|url| process_unit(self.fetcher, self.analyze, url))
            .buffer_unordered(self.concurrency);

        while let Some(outcome) = units.next().await {
            match outcome {
                UnitOutcome::Extracted {
                    url,
                    article,
                    timing,
                } => {
                    report.timings.push(timing);
                    if article.is_empty() {
                        debug!(%url, "No body paragraphs; dropping");
                        report.empty += 1;
                    } else {
                        debug!(%url, bytes = article.text.len(), "Parsed CNN article");
                        report.records.push(article.into_record(self.fields));
                    }
                }
                UnitOutcome::FetchFailed { url, error } => {
                    warn!(%url, error = %error, "Article fetch failed");
                    failures.record(url);
                    report.fetch_failed += 1;
                }
                UnitOutcome::Skipped { url, reason } => {
                    error!(%url, %reason, "Article processing failed; skipping");
                    report.skipped += 1;
                }
            }
        }

        info!(
            total,
            parsed = report.records.len(),
            empty = report.empty,
            skipped = report.skipped,
            fetch_failed = report.fetch_failed,
            "Completed parallel article processing"
        );
        report
    }
}

/// Fetch one URL, then parse and extract it off the async workers.
async fn process_unit<F: FetchPage>(fetcher: &F, analyze: Analyzer, url: String) -> UnitOutcome {
    let fetch_t0 = Instant::now();
    let body = match fetcher.fetch(&url).await {
        Ok(body) => body,
        Err(error) => return UnitOutcome::FetchFailed { url, error },
    };
    let fetch = fetch_t0.elapsed();

    match tokio::task::spawn_blocking(move || analyze(&body)).await {
        Ok((article, parse, extract)) => UnitOutcome::Extracted {
            url,
            article,
            timing: TimingSample {
                fetch,
                parse,
                extract,
            },
        },
        Err(e) => UnitOutcome::Skipped {
            url,
            reason: e.to_string(),
        },
    }
}

/// Parse markup and extract it, timing each stage.
fn parse_and_extract(markup: &str) -> (ExtractedArticle, Duration, Duration) {
    let parse_t0 = Instant::now();
    let document = Html::parse_document(markup);
    let parse = parse_t0.elapsed();

    let extract_t0 = Instant::now();
    let article = extract(&document);
    (article, parse, extract_t0.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::stub::StubFetcher;
    use std::cell::Cell;

    fn article_page(headline: &str, body: &str) -> String {
        format!(
            r#"<html><head>
                 <meta itemprop="headline" content="{headline}">
                 <meta itemprop="dateModified" content="2021-04-14T12:00:00Z">
                 <meta itemprop="keywords" content="news, us">
               </head><body>{body}</body></html>"#
        )
    }

    fn url(i: usize) -> String {
        format!("https://www.cnn.com/2021/04/14/us/story-{i}/index.html")
    }

    #[tokio::test]
    async fn test_failed_fetches_go_to_failure_log() {
        let mut fetcher = StubFetcher::new();
        let urls: Vec<String> = (0..50).map(url).collect();
        for (i, u) in urls.iter().enumerate() {
            fetcher = match i {
                7 | 31 => fetcher.failing(u.clone(), FetchError::Status(504)),
                // video pages: no body paragraphs
                10 | 20 | 40 => fetcher.page(u.clone(), article_page("Video", "<video></video>")),
                _ => fetcher.page(
                    u.clone(),
                    article_page(
                        &format!("Story {i}"),
                        r#"<p class="zn-body__paragraph">Lead. </p><div class="zn-body__paragraph">More.</div>"#,
                    ),
                ),
            };
        }
        let mut failures = FailureLog::new();

        let report = Dispatcher::new(&fetcher, FieldSelection::TEXT)
            .run(urls.clone(), &mut failures)
            .await;

        assert_eq!(report.records.len(), 45);
        assert_eq!(report.empty, 3);
        assert_eq!(report.fetch_failed, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.timings.len(), 48);

        let mut failed = failures.urls().to_vec();
        failed.sort();
        let mut expected = vec![url(7), url(31)];
        expected.sort();
        assert_eq!(failed, expected);

        for record in &report.records {
            assert_eq!(record.text.as_deref(), Some("Lead. More."));
            assert_eq!(record.modified.as_deref(), Some("2021-04-14T12:00:00Z"));
            assert_eq!(record.keywords, None);
        }
    }

    #[tokio::test]
    async fn test_field_selection_applies_to_records() {
        let fetcher = StubFetcher::new().page(
            url(1),
            article_page("Headline", r#"<p class="paragraph inline-placeholder">Body</p>"#),
        );
        let mut failures = FailureLog::new();

        let report = Dispatcher::new(&fetcher, FieldSelection::KEYWORDS)
            .run(vec![url(1)], &mut failures)
            .await;

        assert_eq!(
            report.records,
            vec![ArticleRecord {
                headline: Some("Headline".to_string()),
                modified: Some("2021-04-14T12:00:00Z".to_string()),
                text: None,
                keywords: Some(vec!["news".to_string(), "us".to_string()]),
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_input() {
        let fetcher = StubFetcher::new();
        let mut failures = FailureLog::new();
        let report = Dispatcher::new(&fetcher, FieldSelection::BOTH)
            .run(Vec::new(), &mut failures)
            .await;
        assert!(report.records.is_empty());
        assert_eq!(report.timings.len(), 0);
        assert!(failures.is_empty());
    }

    fn analyze_or_panic(markup: &str) -> (ExtractedArticle, Duration, Duration) {
        if markup.contains("corrupt") {
            panic!("extraction blew up");
        }
        parse_and_extract(markup)
    }

    #[tokio::test]
    async fn test_post_fetch_failure_is_skipped_not_recorded() {
        let body = r#"<p class="zn-body__paragraph">Fine.</p>"#;
        let fetcher = StubFetcher::new()
            .page(url(1), article_page("One", body))
            .page(url(2), article_page("corrupt", body))
            .page(url(3), article_page("Three", body));
        let mut failures = FailureLog::new();

        let report = Dispatcher::new(&fetcher, FieldSelection::BOTH)
            .with_analyzer(analyze_or_panic)
            .run(vec![url(1), url(2), url(3)], &mut failures)
            .await;

        assert_eq!(report.skipped, 1);
        assert_eq!(report.records.len(), 2);
        assert!(report
            .records
            .iter()
            .all(|r| r.headline.as_deref() != Some("corrupt")));
        assert_eq!(report.fetch_failed, 0);
        assert_eq!(report.timings.len(), 2);
        assert!(failures.is_empty());
    }

    struct InFlight {
        current: Cell<usize>,
        peak: Cell<usize>,
    }

    impl FetchPage for InFlight {
        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            self.current.set(self.current.get() + 1);
            self.peak.set(self.peak.get().max(self.current.get()));
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            self.current.set(self.current.get() - 1);
            Ok(r#"<p class="zn-body__paragraph">x</p>"#.to_string())
        }
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let fetcher = InFlight {
            current: Cell::new(0),
            peak: Cell::new(0),
        };
        let mut failures = FailureLog::new();

        let report = Dispatcher::new(&fetcher, FieldSelection::TEXT)
            .with_concurrency(4)
            .run((0..20).map(url).collect(), &mut failures)
            .await;

        assert_eq!(report.records.len(), 20);
        assert!(fetcher.peak.get() <= 4);
        assert!(fetcher.peak.get() > 1);
    }
}
