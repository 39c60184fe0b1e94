// src/pipeline/run.rs

//! Run orchestration: harvest, persist, deliver.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;

use crate::delivery::{Deliverer, MessageSink};
use crate::error::Result;
use crate::models::{Auction, Config};
use crate::pipeline::{Harvester, KnownIds};
use crate::services::{PageSource, Selectors};
use crate::storage::AuctionStore;
use crate::utils::log;

/// Harvest new auctions and insert them into the store.
///
/// Returns the newly stored auctions. If the listing broke off midway, what
/// was resolved before is still stored and the listing error is returned.
pub async fn run_harvest(
    config: &Config,
    source: Arc<dyn PageSource>,
    store: &dyn AuctionStore,
) -> Result<Vec<Auction>> {
    let selectors = Arc::new(Selectors::compile(&config.selectors)?);
    let mut known = KnownIds::new(store.known_ids().await?);

    let harvester = Harvester::new(config, source, selectors);
    let mut outcome = harvester.harvest(&mut known).await?;

    let inserted = store.insert(&outcome.auctions).await?;
    log::summary(
        "Harvest",
        &[
            ("Listed", outcome.listed.to_string()),
            ("Dispatched", outcome.dispatched.to_string()),
            ("Failed", outcome.failed.to_string()),
            ("Stored", inserted.to_string()),
        ],
    );

    if let Some(e) = outcome.listing_error.take() {
        return Err(e);
    }
    Ok(outcome.auctions)
}

/// Deliver auctions ordered by end date, in batches.
///
/// Each batch is marked delivered before it is sent, so an auction is never
/// sent twice even if the run dies mid-batch. Returns the number of
/// messages sent.
pub async fn run_delivery(
    config: &Config,
    store: &dyn AuctionStore,
    sink: &dyn MessageSink,
    mut auctions: Vec<Auction>,
) -> Result<usize> {
    auctions.sort_by(by_end_date);

    let deliverer = Deliverer::new(sink, &config.delivery);
    let mut sent = 0;

    for batch in auctions.chunks(config.delivery.batch_size.max(1)) {
        let ids: Vec<String> = batch.iter().map(|a| a.id.clone()).collect();
        store.mark_delivered(&ids).await?;
        sent += deliverer.deliver(batch).await?;
        log::sub_item(&format!("{} auctions delivered", batch.len()));
    }

    Ok(sent)
}

/// Run the full pipeline: load pending, harvest, deliver.
///
/// Without a sink, harvested auctions are stored and left pending.
pub async fn run_pipeline(
    config: &Config,
    source: Arc<dyn PageSource>,
    store: &dyn AuctionStore,
    sink: Option<&dyn MessageSink>,
) -> Result<()> {
    log::header("Starting auction harvest");

    log::step(1, 3, "Load - Reading undelivered auctions");
    let pending = store.pending_delivery(Utc::now()).await?;
    log::sub_item(&format!("{} auctions pending delivery", pending.len()));

    log::step(2, 3, "Harvest - Fetching new auctions");
    let mut auctions = run_harvest(config, source, store).await?;

    log::step(3, 3, "Deliver - Sending messages");
    // Harvested ids were unknown to the store, so the two sets are disjoint
    auctions.extend(pending);

    match sink {
        Some(sink) => {
            let count = auctions.len();
            let sent = run_delivery(config, store, sink, auctions).await?;
            log::success(&format!("{} auctions delivered in {} messages", count, sent));
        }
        None => log::sub_item(&format!(
            "Delivery disabled, {} auctions left pending",
            auctions.len()
        )),
    }

    Ok(())
}

/// Ascending end date; undated auctions go last.
fn by_end_date(a: &Auction, b: &Auction) -> Ordering {
    match (a.end_date, b.end_date) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
