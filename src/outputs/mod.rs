//! Output sinks for a finished run.
//!
//! # Submodules
//!
//! - [`json`]: writes the article records and the failed-URL list as JSON

pub mod json;
