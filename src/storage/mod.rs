//! Storage abstractions for auction persistence.
//!
//! The store owns the `was_delivered` flag: harvesting only inserts new
//! records, delivery marks them.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml        # Harvester configuration
//! └── auctions.json      # Every stored auction
//! ```

pub mod local;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Auction;

// Re-export for convenience
pub use local::JsonStore;

/// On-disk layout of the auction file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreData {
    /// ISO 8601 timestamp of last update
    pub updated_at: DateTime<Utc>,
    /// Total auction count
    pub count: usize,
    /// The auctions array
    pub auctions: Vec<Auction>,
}

impl StoreData {
    pub fn new(auctions: Vec<Auction>) -> Self {
        Self {
            updated_at: Utc::now(),
            count: auctions.len(),
            auctions,
        }
    }
}

/// Trait for auction storage backends.
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// Ids of every stored auction, used to seed deduplication.
    async fn known_ids(&self) -> Result<HashSet<String>>;

    /// Insert auctions whose id is not stored yet. Returns how many were new.
    async fn insert(&self, auctions: &[Auction]) -> Result<usize>;

    /// Flag the given auctions as delivered.
    async fn mark_delivered(&self, ids: &[String]) -> Result<()>;

    /// Undelivered auctions whose end date is after `now`.
    async fn pending_delivery(&self, now: DateTime<Utc>) -> Result<Vec<Auction>>;

    /// Every stored auction.
    async fn load_all(&self) -> Result<Vec<Auction>>;
}
