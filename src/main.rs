//! # CNN Sitemap News
//!
//! Crawls the CNN US monthly sitemaps for a year (or a single month),
//! downloads every listed article and exports headline, last-modified date,
//! body text and keywords as JSON.
//!
//! ## Usage
//!
//! ```sh
//! cnn_sitemap_news 2021 4 -o ./out
//! cnn_sitemap_news 2020 all --fields text
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Indexing**: Walk the monthly sitemaps and collect article URLs
//! 2. **Fetching + Extraction**: Download and parse each article (32 at a time)
//! 3. **Output**: Write the records file, plus a failures file if any fetch failed

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod dispatch;
mod extract;
mod fetch;
mod links;
mod models;
mod outputs;
mod scrapers;
mod timing;
mod utils;

use cli::Cli;
use config::ScrapeConfig;
use dispatch::Dispatcher;
use fetch::{http_fetcher, FetchPage};
use links::resolve_links;
use models::FailureLog;
use outputs::json::{failures_path, records_path, write_failures, write_records};
use scrapers::cnn::SitemapCrawler;
use utils::ensure_writable_dir;

/// Shown to the user when a run aborts; the cause goes to the log.
const FAILURE_MESSAGE: &str = "The scrape could not be completed. Rerun with RUST_LOG=debug for details.";

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("cnn_sitemap_news starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let code = match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Run aborted");
            eprintln!("{FAILURE_MESSAGE}");
            ExitCode::FAILURE
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    code
}

#[instrument(level = "info", skip_all, fields(year = args.year, period = %args.period))]
async fn run(args: &Cli) -> Result<(), Box<dyn Error>> {
    let config = ScrapeConfig::from_cli(args)?;
    ensure_writable_dir(&config.output_dir).await?;

    let fetcher = http_fetcher(config.timeout, config.retry)?;
    let mut failures = FailureLog::new();

    // ---- Index sitemaps ----
    let hrefs = index_articles(&config, &fetcher, &mut failures).await?;
    let urls = resolve_links(&config.base_url, hrefs, &mut failures);
    info!(count = urls.len(), "Found articles; parsing");

    // ---- Fetch and extract articles ----
    let report = Dispatcher::new(&fetcher, config.fields)
        .with_concurrency(config.concurrency)
        .run(urls, &mut failures)
        .await;
    report.timings.log_summary();

    // ---- Output ----
    let path = records_path(&config.output_dir, config.year, config.period);
    write_records(&report.records, &path).await?;
    flush_failures(&config, &failures).await?;

    info!(
        path = %path.display(),
        records = report.records.len(),
        empty = report.empty,
        skipped = report.skipped,
        failed = failures.len(),
        "Exported articles"
    );
    Ok(())
}

/// Crawl the configured period.
///
/// On a crawl error the failure list is flushed before the crawl error is
/// returned; a flush error is only logged.
async fn index_articles<F: FetchPage>(
    config: &ScrapeConfig,
    fetcher: &F,
    failures: &mut FailureLog,
) -> Result<Vec<String>, Box<dyn Error>> {
    let crawler = SitemapCrawler::new(fetcher, config.base_url.clone());
    match crawler.crawl(config.year, config.period, failures).await {
        Ok(hrefs) => Ok(hrefs),
        Err(e) => {
            if let Err(flush_err) = flush_failures(config, failures).await {
                error!(error = %flush_err, "Could not write failure list");
            }
            Err(e.into())
        }
    }
}

/// Write the failure list next to the main output, if anything failed.
async fn flush_failures(config: &ScrapeConfig, failures: &FailureLog) -> Result<(), Box<dyn Error>> {
    let path = failures_path(&config.output_dir, config.year, config.period);
    if write_failures(failures, &path).await? {
        info!(path = %path.display(), count = failures.len(), "Exported failed URLs");
    }
    Ok(())
}
