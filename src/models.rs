//! Data models for scraped articles and per-run bookkeeping.
//!
//! - [`ArticleRecord`]: one exported article, as written to the output JSON
//! - [`FieldSelection`]: which optional fields a record carries
//! - [`FailureLog`]: URLs whose fetch failed during the current run
//! - [`Period`]: the stretch of sitemaps a run covers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single exported article.
///
/// `headline` and `modified` are always serialized, as `null` when the page
/// did not carry the corresponding metadata. `text` and `keywords` only appear
/// when the run's [`FieldSelection`] asked for them.
///
/// # JSON Shape
///
/// ```text
/// {
///   "headline": "Some headline",
///   "modified": "2021-03-04T12:00:00Z",
///   "text": "Full article text..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// Alternative headline, falling back to the main headline.
    pub headline: Option<String>,
    /// Last-modified timestamp, verbatim from the page metadata.
    pub modified: Option<String>,
    /// Concatenated body paragraphs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Keyword metadata, split on commas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

/// Which optional fields are included in each [`ArticleRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSelection {
    pub include_text: bool,
    pub include_keywords: bool,
}

impl FieldSelection {
    /// Body text only.
    pub const TEXT: Self = Self {
        include_text: true,
        include_keywords: false,
    };
    /// Keyword metadata only.
    pub const KEYWORDS: Self = Self {
        include_text: false,
        include_keywords: true,
    };
    /// Body text and keywords.
    pub const BOTH: Self = Self {
        include_text: true,
        include_keywords: true,
    };
}

impl Default for FieldSelection {
    fn default() -> Self {
        Self::BOTH
    }
}

/// Run-scoped list of URLs whose fetch ultimately failed.
///
/// Append-only for the duration of a run. Only the coordinating task writes
/// to it; workers hand their failures back as values.
#[derive(Debug, Default, Clone)]
pub struct FailureLog {
    urls: Vec<String>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a URL whose fetch failed.
    pub fn record(&mut self, url: impl Into<String>) {
        self.urls.push(url.into());
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}

/// Which sitemaps a run crawls: one month, or all twelve of a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    All,
    Month(u32),
}

impl FromStr for Period {
    type Err = String;

    /// Accepts `all` or a month number; leading zeros are fine (`03` is March).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Period::All);
        }
        match s.parse::<u32>() {
            Ok(month @ 1..=12) => Ok(Period::Month(month)),
            Ok(month) => Err(format!("month must be between 1 and 12, got {month}")),
            Err(_) => Err(format!("expected `all` or a month number, got `{s}`")),
        }
    }
}

/// Renders as it appears in output file names: `all` or the unpadded month.
impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::All => f.write_str("all"),
            Period::Month(m) => write!(f, "{m}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<ArticleRecord> {
        vec![
            ArticleRecord {
                headline: Some("Markets rally".to_string()),
                modified: Some("2021-04-14T10:00:00Z".to_string()),
                text: Some("Stocks rose on Wednesday. Investors cheered.".to_string()),
                keywords: Some(vec!["markets".to_string(), "stocks".to_string()]),
            },
            ArticleRecord {
                headline: None,
                modified: None,
                text: Some("Body only.".to_string()),
                keywords: None,
            },
        ]
    }

    #[test]
    fn test_record_list_round_trip() {
        let records = sample_records();
        let json = serde_json::to_string_pretty(&records).unwrap();
        let back: Vec<ArticleRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, records);
        assert_eq!(back[1].headline, None);
        assert_eq!(back[1].modified, None);
    }

    #[test]
    fn test_absent_metadata_serializes_as_null() {
        let json = serde_json::to_value(&sample_records()[1]).unwrap();
        assert!(json["headline"].is_null());
        assert!(json["modified"].is_null());
        assert!(json.get("keywords").is_none());
        assert_eq!(json["text"], "Body only.");
    }

    #[test]
    fn test_null_fields_deserialize_as_absent() {
        let json = r#"{"headline": null, "modified": null, "text": "x"}"#;
        let record: ArticleRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.headline, None);
        assert_eq!(record.keywords, None);
        assert_eq!(record.text.as_deref(), Some("x"));
    }

    #[test]
    fn test_failure_log_appends_in_order() {
        let mut log = FailureLog::new();
        assert!(log.is_empty());
        log.record("https://us.cnn.com/a");
        log.record(String::from("https://us.cnn.com/b"));
        assert_eq!(log.len(), 2);
        assert_eq!(log.urls(), ["https://us.cnn.com/a", "https://us.cnn.com/b"]);
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("all".parse::<Period>(), Ok(Period::All));
        assert_eq!("ALL".parse::<Period>(), Ok(Period::All));
        assert_eq!("3".parse::<Period>(), Ok(Period::Month(3)));
        assert_eq!("03".parse::<Period>(), Ok(Period::Month(3)));
        assert_eq!("10".parse::<Period>(), Ok(Period::Month(10)));
        assert!("0".parse::<Period>().is_err());
        assert!("13".parse::<Period>().is_err());
        assert!("march".parse::<Period>().is_err());
    }

    #[test]
    fn test_period_display() {
        assert_eq!(Period::All.to_string(), "all");
        assert_eq!(Period::Month(7).to_string(), "7");
    }

    #[test]
    fn test_default_selection_includes_everything() {
        assert_eq!(FieldSelection::default(), FieldSelection::BOTH);
    }
}
