// src/services/listing.rs

//! Listing crawler.
//!
//! Walks the paginated search results of each configured status and yields
//! `(status, id)` pairs lazily: the next page is only requested once the
//! consumer has pulled every id of the current one, and dropping the stream
//! stops the crawl.

use std::sync::Arc;

use async_stream::try_stream;
use futures::Stream;
use scraper::Html;

use crate::error::{AppError, Result};
use crate::models::{AuctionStatus, ListingConfig};
use crate::services::{PageRequest, PageSource, Selectors};
use crate::utils::query_param;

/// Query key of the search session id in pagination links.
const SEARCH_ID_PARAM: &str = "id_busqueda";

/// Query key of the auction id in result links.
const AUCTION_ID_PARAM: &str = "idSub";

/// Crawls the search endpoint for auction identifiers.
pub struct ListingCrawler {
    source: Arc<dyn PageSource>,
    selectors: Arc<Selectors>,
    config: ListingConfig,
}

impl ListingCrawler {
    pub fn new(
        source: Arc<dyn PageSource>,
        selectors: Arc<Selectors>,
        config: ListingConfig,
    ) -> Self {
        Self {
            source,
            selectors,
            config,
        }
    }

    /// Stream every listed `(status, id)` in source order, status by status.
    ///
    /// Fails if the first page of a status carries no search session cursor.
    pub fn stream(&self) -> impl Stream<Item = Result<(AuctionStatus, String)>> + '_ {
        try_stream! {
            let page_size = self.config.page_size;

            for &status in &self.config.statuses {
                log::info!("Obtaining auctions with status {}", status);

                let body = self
                    .source
                    .fetch(&PageRequest::Search { status, page_size })
                    .await?;
                let (cursor, mut ids) = self.parse_first_page(&body, status)?;
                let mut offset = page_size;

                while !ids.is_empty() {
                    let count = ids.len();
                    for id in ids {
                        yield (status, id);
                    }
                    log::info!("+{} items of type {}", count, status);

                    if offset >= self.config.offset_ceiling {
                        log::warn!(
                            "Reached offset ceiling {} for status {}, stopping",
                            self.config.offset_ceiling,
                            status
                        );
                        break;
                    }

                    let request = PageRequest::More {
                        cursor: cursor.clone(),
                        offset,
                        page_size,
                    };
                    let body = self.source.fetch(&request).await?;
                    ids = self.parse_result_ids(&body);
                    offset += page_size;
                }
            }
        }
    }

    /// Extract the session cursor and the ids of the first result page.
    fn parse_first_page(&self, body: &str, status: AuctionStatus) -> Result<(String, Vec<String>)> {
        let document = Html::parse_document(body);
        let cursor = document
            .select(&self.selectors.search_cursor)
            .next()
            .and_then(|link| link.value().attr("href"))
            .and_then(|href| query_param(href, SEARCH_ID_PARAM))
            .and_then(|search_id| cursor_from_search_id(&search_id))
            .ok_or_else(|| {
                AppError::structural(format!("listing[{status}]"), "No search ID found")
            })?;

        Ok((cursor, self.result_ids(&document)))
    }

    fn parse_result_ids(&self, body: &str) -> Vec<String> {
        self.result_ids(&Html::parse_document(body))
    }

    fn result_ids(&self, document: &Html) -> Vec<String> {
        document
            .select(&self.selectors.result_links)
            .filter_map(|link| link.value().attr("href"))
            .filter_map(|href| query_param(href, AUCTION_ID_PARAM))
            .collect()
    }
}

/// Strip the `-{offset}-{size}` suffix from a search id.
fn cursor_from_search_id(search_id: &str) -> Option<String> {
    let cursor = search_id.rsplitn(3, '-').last()?;
    if cursor.is_empty() {
        None
    } else {
        Some(cursor.to_string())
    }
}
