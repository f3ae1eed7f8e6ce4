//! Run configuration: CLI arguments layered over an optional YAML file.
//!
//! Precedence, lowest to highest: built-in defaults, settings file, CLI flags.
//!
//! # Settings File
//!
//! ```yaml
//! base_url: https://us.cnn.com
//! concurrency: 16
//! timeout_secs: 10
//! max_retries: 3
//! backoff_factor: 0.3
//! ```

use crate::cli::Cli;
use crate::dispatch::MAX_WORKERS;
use crate::fetch::{RetryPolicy, MAX_BACKOFF, REQUEST_TIMEOUT};
use crate::models::{FieldSelection, Period};
use crate::scrapers::cnn::DEFAULT_BASE_URL;
use chrono::{Datelike, Local};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Highest accepted `max_retries`.
pub const RETRY_LIMIT: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read settings file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid settings file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid base URL `{url}`: {source}")]
    BaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("year {year} is outside 1..={current}")]
    Year { year: i32, current: i32 },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("max_retries {0} exceeds the limit of {limit}", limit = RETRY_LIMIT)]
    Retries(u32),
    #[error("backoff_factor {0} must be a number of seconds within 0..={max}", max = MAX_BACKOFF.as_secs())]
    Backoff(f64),
}

/// Optional overrides read from a YAML file.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub base_url: Option<String>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub backoff_factor: Option<f64>,
}

impl SettingsFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let settings: SettingsFile = serde_yaml::from_str(&raw)?;
        debug!(?settings, "Loaded settings file");
        Ok(settings)
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeConfig {
    pub year: i32,
    pub period: Period,
    pub fields: FieldSelection,
    pub output_dir: PathBuf,
    pub base_url: Url,
    pub concurrency: usize,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ScrapeConfig {
    /// Build from parsed CLI arguments, loading the settings file if given.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let settings = match &cli.config {
            Some(path) => SettingsFile::load(Path::new(path))?,
            None => SettingsFile::default(),
        };
        let config = Self::resolve(cli, settings, Local::now().year())?;
        info!(
            year = config.year,
            period = %config.period,
            base_url = %config.base_url,
            concurrency = config.concurrency,
            "Resolved configuration"
        );
        Ok(config)
    }

    /// Merge defaults, settings file and CLI, then validate.
    pub fn resolve(cli: &Cli, settings: SettingsFile, current_year: i32) -> Result<Self, ConfigError> {
        if cli.year < 1 || cli.year > current_year {
            return Err(ConfigError::Year {
                year: cli.year,
                current: current_year,
            });
        }

        let raw_url = cli
            .base_url
            .clone()
            .or(settings.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&raw_url).map_err(|source| ConfigError::BaseUrl {
            url: raw_url.clone(),
            source,
        })?;

        let concurrency = cli
            .concurrency
            .or(settings.concurrency)
            .unwrap_or(MAX_WORKERS);
        if concurrency == 0 {
            return Err(ConfigError::Zero("concurrency"));
        }

        let timeout = settings
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(REQUEST_TIMEOUT);
        if timeout.is_zero() {
            return Err(ConfigError::Zero("timeout_secs"));
        }

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_retries: settings.max_retries.unwrap_or(defaults.max_retries),
            backoff_factor: settings.backoff_factor.unwrap_or(defaults.backoff_factor),
        };
        if retry.max_retries > RETRY_LIMIT {
            return Err(ConfigError::Retries(retry.max_retries));
        }
        if !(0.0..=MAX_BACKOFF.as_secs_f64()).contains(&retry.backoff_factor) {
            return Err(ConfigError::Backoff(retry.backoff_factor));
        }

        Ok(Self {
            year: cli.year,
            period: cli.period,
            fields: cli.fields.into(),
            output_dir: PathBuf::from(&cli.output_dir),
            base_url,
            concurrency,
            timeout,
            retry,
        })
    }
}
