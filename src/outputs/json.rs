//! JSON export of scraped articles and of the run's failed URLs.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── CNN_2021_4.json            # records for April 2021
//! ├── CNN_2021_4_failures.json   # only when something failed
//! └── CNN_2020_all.json          # records for a whole-year run
//! ```

use crate::models::{ArticleRecord, FailureLog, Period};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Main output path: `{dir}/CNN_{year}_{month|all}.json`.
pub fn records_path(dir: &Path, year: i32, period: Period) -> PathBuf {
    dir.join(format!("CNN_{year}_{period}.json"))
}

/// Failure list path: `{dir}/CNN_{year}_{month|all}_failures.json`.
pub fn failures_path(dir: &Path, year: i32, period: Period) -> PathBuf {
    dir.join(format!("CNN_{year}_{period}_failures.json"))
}

/// Write the records as a pretty-printed JSON array.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_records(records: &[ArticleRecord], path: &Path) -> Result<(), Box<dyn Error>> {
    write_json(records, path).await?;
    info!("Wrote article records");
    Ok(())
}

/// Write the failed URLs as a JSON array of strings.
///
/// Returns `Ok(false)` without touching the filesystem when nothing failed.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = failures.len()))]
pub async fn write_failures(failures: &FailureLog, path: &Path) -> Result<bool, Box<dyn Error>> {
    if failures.is_empty() {
        return Ok(false);
    }
    write_json(failures.urls(), path).await?;
    info!("Wrote failed URLs");
    Ok(true)
}

async fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    if let Err(e) = fs::write(path, json).await {
        error!(path = %path.display(), error = %e, "Failed to write JSON");
        return Err(e.into());
    }
    Ok(())
}
