//! Activities domain module.
//!
//! Retrieves the public activity listing page and turns it into structured
//! [`Activity`] records.
//!
//! ## Architecture
//!
//! - `fetcher.rs` - Single timed HTTP GET of the listing page
//! - `extractor.rs` - HTML parsing and per-item field extraction
//! - `query.rs` - Fetch + extract + optional result cap
//! - `text.rs` - Whitespace cleaning, counters and URL resolution
//! - `model.rs` - The `Activity` record
//! - `error.rs` - Network / parse error types

mod error;
pub mod extractor;
pub mod fetcher;
mod model;
mod query;
pub mod text;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ActivityError, ActivityResult, NetworkError};
pub use extractor::Extractor;
pub use fetcher::{HttpFetcher, PageSource};
pub use model::{Activity, UNTITLED_ACTIVITY};
pub use query::ActivityQuery;
