//! Article page extraction: body text, headline, modification date, keywords.
//!
//! # Body Paragraphs
//!
//! CNN article pages put body paragraphs under several markup shapes. Older
//! templates use a `<p>` for the first paragraph and `<div>`s for the rest,
//! both tagged `body__paragraph`; newer ones use
//! `<p class="paragraph inline-placeholder">`. Each shape is one
//! [`ParagraphRule`]. Elements are visited in document order and kept when
//! any rule matches, so an element matched twice counts once and rule order
//! never affects output order. Texts are concatenated with no separator.
//!
//! # Metadata
//!
//! Fields come from `<meta itemprop=... content=...>` tags. A missing tag or
//! missing `content` attribute only leaves that one field absent.

use crate::models::{ArticleRecord, FieldSelection};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// One markup shape that holds body paragraphs.
struct ParagraphRule {
    selector: Selector,
}

impl ParagraphRule {
    fn new(css: &str) -> Self {
        Self {
            selector: Selector::parse(css).unwrap(),
        }
    }

    fn matches(&self, element: &ElementRef<'_>) -> bool {
        self.selector.matches(element)
    }
}

static PARAGRAPH_RULES: Lazy<Vec<ParagraphRule>> = Lazy::new(|| {
    vec![
        // <p> and <div> forms alike
        ParagraphRule::new(r#"[class*="body__paragraph"]"#),
        ParagraphRule::new(r#"p[class*="paragraph inline-placeholder"]"#),
    ]
});

static ANY_ELEMENT: Lazy<Selector> = Lazy::new(|| Selector::parse("*").unwrap());

static DATE_MODIFIED: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[itemprop="dateModified"]"#).unwrap());
static ALTERNATIVE_HEADLINE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[itemprop="alternativeHeadline"]"#).unwrap());
static HEADLINE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[itemprop="headline"]"#).unwrap());
static KEYWORDS_ITEMPROP: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[itemprop="keywords"]"#).unwrap());
static KEYWORDS_NAME: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="keywords"]"#).unwrap());

/// Everything pulled out of one article page, before field selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub headline: Option<String>,
    pub modified: Option<String>,
    pub text: String,
    pub keywords: Vec<String>,
}

impl ExtractedArticle {
    /// Pages without body paragraphs (video pages, galleries) are not articles.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Project into an output record carrying only the selected fields.
    pub fn into_record(self, fields: FieldSelection) -> ArticleRecord {
        ArticleRecord {
            headline: self.headline,
            modified: self.modified,
            text: fields.include_text.then_some(self.text),
            keywords: fields.include_keywords.then_some(self.keywords),
        }
    }
}

/// Extract all fields from a parsed article page.
pub fn extract(document: &Html) -> ExtractedArticle {
    ExtractedArticle {
        headline: meta_content(document, &ALTERNATIVE_HEADLINE)
            .or_else(|| meta_content(document, &HEADLINE)),
        modified: meta_content(document, &DATE_MODIFIED),
        text: body_text(document),
        keywords: keywords(document),
    }
}

/// `content` of the first element matching `selector`.
fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::to_string)
}

fn keywords(document: &Html) -> Vec<String> {
    meta_content(document, &KEYWORDS_ITEMPROP)
        .or_else(|| meta_content(document, &KEYWORDS_NAME))
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Concatenated text of every paragraph matched by any rule, in document order.
fn body_text(document: &Html) -> String {
    document
        .select(&ANY_ELEMENT)
        .filter(|el| PARAGRAPH_RULES.iter().any(|rule| rule.matches(el)))
        .flat_map(|el| el.text())
        .collect()
}
