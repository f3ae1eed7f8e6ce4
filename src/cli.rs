//! Command-line interface definitions.
//!
//! Year and period are positional; everything else is an optional flag, some
//! with environment variable fallbacks.

use crate::models::{FieldSelection, Period};
use clap::{Parser, ValueEnum};

/// Which fields each exported record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FieldMode {
    /// Body text and keywords
    #[value(alias = "default")]
    Both,
    /// Body text only
    Text,
    /// Keywords only
    Keywords,
}

impl From<FieldMode> for FieldSelection {
    fn from(mode: FieldMode) -> Self {
        match mode {
            FieldMode::Both => FieldSelection::BOTH,
            FieldMode::Text => FieldSelection::TEXT,
            FieldMode::Keywords => FieldSelection::KEYWORDS,
        }
    }
}

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Every article from April 2021, text only
/// cnn_sitemap_news 2021 4 --fields text
///
/// # A whole year, written to ./out
/// cnn_sitemap_news 2020 all -o ./out
///
/// # Overrides from a YAML settings file
/// cnn_sitemap_news 2020 all -c settings.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Year of interest, e.g. 2021
    pub year: i32,

    /// `all` for the whole year, or a month number (1-12)
    pub period: Period,

    /// Fields to include in each record
    #[arg(short, long, value_enum, default_value_t = FieldMode::Both)]
    pub fields: FieldMode,

    /// Output directory for the JSON files
    #[arg(short, long, env = "CNN_OUTPUT_DIR", default_value = ".")]
    pub output_dir: String,

    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Sitemap host, e.g. https://us.cnn.com
    #[arg(long, env = "CNN_BASE_URL")]
    pub base_url: Option<String>,

    /// Maximum number of articles processed concurrently
    #[arg(long)]
    pub concurrency: Option<usize>,
}
