// src/pipeline/harvest.rs

//! Harvest coordinator.
//!
//! Pulls identifiers from the listing, drops the ones already known, and
//! resolves the rest with bounded concurrency. A failed record is logged and
//! counted; a failed listing stops dispatching but keeps what was resolved.

use std::collections::HashSet;
use std::future;
use std::pin::pin;
use std::sync::Arc;

use futures::StreamExt;

use crate::error::Result;
use crate::models::{Config, HarvestOutcome};
use crate::pipeline::CircuitBreaker;
use crate::services::{DetailResolver, ListingCrawler, PageSource, Selectors};

/// Progress is logged every this many resolved auctions.
const PROGRESS_EVERY: usize = 50;

/// Identifiers seen so far in a run, seeded with the ones already stored.
#[derive(Debug, Default)]
pub struct KnownIds {
    ids: HashSet<String>,
    listed: usize,
}

impl KnownIds {
    pub fn new(seed: impl IntoIterator<Item = String>) -> Self {
        Self {
            ids: seed.into_iter().collect(),
            listed: 0,
        }
    }

    /// Record a listed id. Returns true only the first time an id is seen.
    pub fn admit(&mut self, id: &str) -> bool {
        self.listed += 1;
        if self.ids.contains(id) {
            false
        } else {
            self.ids.insert(id.to_string())
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of ids offered to [`admit`](Self::admit), duplicates included.
    pub fn listed(&self) -> usize {
        self.listed
    }
}

/// Runs listing and resolution for one harvest.
pub struct Harvester {
    crawler: ListingCrawler,
    resolver: DetailResolver,
    concurrency: usize,
    circuit_breaker: CircuitBreaker,
}

impl Harvester {
    pub fn new(config: &Config, source: Arc<dyn PageSource>, selectors: Arc<Selectors>) -> Self {
        Self {
            crawler: ListingCrawler::new(
                Arc::clone(&source),
                Arc::clone(&selectors),
                config.listing.clone(),
            ),
            resolver: DetailResolver::new(source, selectors),
            concurrency: config.harvest.concurrency.max(1),
            circuit_breaker: CircuitBreaker::new(),
        }
    }

    /// Harvest every listed auction not yet in `known`.
    ///
    /// Newly admitted ids are added to `known` as they are dispatched, whether
    /// or not their resolution succeeds. Returns an error if the listing was
    /// empty or every dispatched resolution failed; a listing failure after
    /// some progress is reported through [`HarvestOutcome::listing_error`].
    pub async fn harvest(&self, known: &mut KnownIds) -> Result<HarvestOutcome> {
        let mut outcome = HarvestOutcome::default();
        let listed_before = known.listed();

        let mut listing_error = None;
        {
            let resolver = &self.resolver;
            // A listing error ends the id stream; resolutions already in
            // flight still run to completion.
            let mut results = pin!(
                self.crawler
                    .stream()
                    .scan(&mut listing_error, |error, item| {
                        future::ready(item.map_err(|e| **error = Some(e)).ok())
                    })
                    .filter(|(_, id)| future::ready(known.admit(id)))
                    .map(|(status, id)| async move {
                        let result = resolver.resolve(status, &id).await;
                        (id, result)
                    })
                    .buffer_unordered(self.concurrency)
            );

            while let Some((id, result)) = results.next().await {
                outcome.dispatched += 1;
                match result {
                    Ok(auction) => {
                        log::debug!("Done: {} ({} lots)", id, auction.lots.len());
                        outcome.auctions.push(auction);
                        if outcome.auctions.len() % PROGRESS_EVERY == 0 {
                            log::info!("{} auctions loaded...", outcome.auctions.len());
                        }
                    }
                    Err(e) => {
                        log::warn!("Error loading auction '{}': {}", id, e);
                        outcome.failed += 1;
                    }
                }
            }
        }

        if let Some(e) = &listing_error {
            log::error!("Listing failed: {}", e);
        }
        outcome.listing_error = listing_error;

        outcome.listed = known.listed() - listed_before;
        log::info!(
            "Harvest finished: {} listed, {} dispatched, {} loaded, {} failed",
            outcome.listed,
            outcome.dispatched,
            outcome.auctions.len(),
            outcome.failed
        );

        if outcome.listing_error.is_none() {
            self.circuit_breaker.validate(&outcome)?;
        }
        Ok(outcome)
    }
}
