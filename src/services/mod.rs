//! Service layer for the harvester.
//!
//! This module contains the scraping logic:
//! - Page fetching behind a retrying source (`PageSource`, `RetryingSource`)
//! - Listing pagination (`ListingCrawler`)
//! - Detail resolution (`DetailResolver`)
//! - Label/value extraction and field parsing

mod detail;
pub mod extract;
pub mod fields;
mod listing;
pub mod parsers;
mod selectors;
mod source;

#[cfg(test)]
pub(crate) mod fixtures;

pub use detail::DetailResolver;
pub use listing::ListingCrawler;
pub use selectors::Selectors;
pub use source::{DetailView, PageRequest, PageSource, RetryingSource};
