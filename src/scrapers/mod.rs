//! Sitemap scrapers that discover article URLs.
//!
//! Discovery is the first of two phases:
//!
//! 1. **Indexing**: walk the publisher's sitemap pages and collect article URLs
//! 2. **Fetching**: download and extract each article ([`crate::dispatch`])
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | CNN US | [`cnn`] | Monthly HTML sitemaps | One page per month, fetched sequentially |

pub mod cnn;
