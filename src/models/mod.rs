// src/models/mod.rs

//! Domain models for the harvester.

use crate::error::AppError;

mod auction;
mod config;
mod selectors;

// Re-export all public types
pub use auction::{Auction, AuctionStatus, Authority, DEFAULT_LOT_ID, Lot, RelatedPerson};
pub use config::{
    Config, DeliveryConfig, HarvestConfig, HttpConfig, ListingConfig, StorageConfig,
};
pub use selectors::SourceSelectors;

/// Summary of one harvest run.
#[derive(Debug, Default)]
pub struct HarvestOutcome {
    /// Successfully resolved auctions, in completion order
    pub auctions: Vec<Auction>,
    /// Identifiers yielded by the listing, duplicates included
    pub listed: usize,
    /// Identifiers admitted for resolution
    pub dispatched: usize,
    /// Resolutions that failed
    pub failed: usize,
    /// Listing failure that cut the run short, if any
    pub listing_error: Option<AppError>,
}
