// src/services/detail.rs

//! Detail resolver.
//!
//! Turns one listed identifier into a fully populated [`Auction`] by reading
//! its general view and then, depending on which tabs the page advertises,
//! the authority, related-parties and lots views.

use std::collections::HashSet;
use std::sync::Arc;

use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Auction, AuctionStatus, Authority, DEFAULT_LOT_ID, Lot, RelatedPerson};
use crate::services::extract::{Row, element_text, read_rows, text};
use crate::services::fields::{
    AUTHORITY_FIELDS, GENERAL_FIELDS, GeneralSection, LOT_FIELDS, MULTI_LOT_HEADER,
    RELATED_PERSON_FIELDS, SINGLE_LOT_VALUE, Tab, parse_tabs,
};
use crate::services::{DetailView, PageRequest, PageSource, Selectors};

/// Parsed general view.
struct GeneralPage {
    auction: Auction,
    /// Lot carrying the money fields of the general table
    lot: Lot,
    multiple_lots: bool,
    tabs: HashSet<Tab>,
}

/// Parsed lots view (one lot).
struct LotPage {
    /// Lot ids from the lot tab index, if the page has one
    lot_ids: Vec<String>,
    kind: Option<String>,
    summary: Option<String>,
    rows: Vec<Row>,
}

impl LotPage {
    fn fill(&self, lot: &mut Lot) {
        lot.kind = self.kind.clone();
        lot.summary = self.summary.clone();
        let record_id = lot.auction_id.clone();
        LOT_FIELDS.apply_rows(&self.rows, lot, &record_id);
    }
}

/// Resolves auction identifiers into complete records.
pub struct DetailResolver {
    source: Arc<dyn PageSource>,
    selectors: Arc<Selectors>,
}

impl DetailResolver {
    pub fn new(source: Arc<dyn PageSource>, selectors: Arc<Selectors>) -> Self {
        Self { source, selectors }
    }

    /// Fetch and assemble one auction.
    ///
    /// The optional sections are fetched concurrently and all of them are
    /// awaited before the first error, if any, is returned.
    pub async fn resolve(&self, status: AuctionStatus, id: &str) -> Result<Auction> {
        log::debug!("Resolving auction {}", id);

        let body = self
            .source
            .fetch(&PageRequest::detail(DetailView::General, id))
            .await?;
        let GeneralPage {
            mut auction,
            lot,
            multiple_lots,
            tabs,
        } = self.parse_general(&body, id, status)?;

        if tabs.contains(&Tab::Bids) {
            log::debug!("Auction {} has a bids tab, not fetched", id);
        }

        let single_lot = (!multiple_lots).then(|| lot.clone());
        let (authority, related, lots) = futures::join!(
            self.load_authority(id, tabs.contains(&Tab::Authority)),
            self.load_related(id, tabs.contains(&Tab::Related)),
            self.load_lots(id, tabs.contains(&Tab::Lots), single_lot),
        );

        auction.authority = authority?;
        (auction.creditor, auction.administrator) = related?;
        auction.lots = lots?;

        if auction.lots.is_empty() {
            log::warn!("No lots found in auction {}, keeping general data as lot", id);
            auction.lots.push(lot);
        }

        Ok(auction)
    }

    fn parse_general(&self, body: &str, id: &str, status: AuctionStatus) -> Result<GeneralPage> {
        let document = Html::parse_document(body);

        let labels: Vec<String> = document
            .select(&self.selectors.tab_links)
            .map(element_text)
            .collect();
        if labels.is_empty() {
            return Err(AppError::structural(
                format!("auction {id}"),
                "No tab index found",
            ));
        }
        let tabs = parse_tabs(labels.iter().map(String::as_str), id);

        let rows = self
            .rows(&document, &self.selectors.general_rows)
            .ok_or_else(|| AppError::structural(format!("auction {id}"), "No general data found"))?;

        let mut section = GeneralSection {
            auction: Auction::new(id, status),
            lot: Lot::new(id, DEFAULT_LOT_ID),
        };
        let mut multiple_lots = false;

        for row in &rows {
            match row.pair() {
                Some((MULTI_LOT_HEADER, value)) => multiple_lots = value != SINGLE_LOT_VALUE,
                Some((header, value)) => {
                    GENERAL_FIELDS.apply(header, value, &mut section, id);
                }
                None => log::warn!("No headers found in auction {}", id),
            }
        }

        Ok(GeneralPage {
            auction: section.auction,
            lot: section.lot,
            multiple_lots,
            tabs,
        })
    }

    async fn load_authority(&self, id: &str, present: bool) -> Result<Option<Authority>> {
        if !present {
            return Ok(None);
        }

        let body = self
            .source
            .fetch(&PageRequest::detail(DetailView::Authority, id))
            .await?;

        let document = Html::parse_document(&body);
        let rows = self
            .rows(&document, &self.selectors.authority_rows)
            .ok_or_else(|| AppError::structural(format!("auction {id}"), "No authority data found"))?;

        let mut authority = Authority::default();
        AUTHORITY_FIELDS.apply_rows(&rows, &mut authority, id);
        Ok(Some(authority))
    }

    async fn load_related(
        &self,
        id: &str,
        present: bool,
    ) -> Result<(Option<RelatedPerson>, Option<RelatedPerson>)> {
        if !present {
            return Ok((None, None));
        }

        let body = self
            .source
            .fetch(&PageRequest::detail(DetailView::Related, id))
            .await?;

        let document = Html::parse_document(&body);
        let creditor = self.related_person(&document, &self.selectors.creditor_rows, id);
        let administrator = self.related_person(&document, &self.selectors.administrator_rows, id);

        if creditor.is_none() && administrator.is_none() {
            log::info!("No creditor nor administrator found in auction {}", id);
        }
        Ok((creditor, administrator))
    }

    fn related_person(&self, document: &Html, rows: &Selector, id: &str) -> Option<RelatedPerson> {
        let rows = self.rows(document, rows)?;
        let mut person = RelatedPerson::default();
        RELATED_PERSON_FIELDS.apply_rows(&rows, &mut person, id);
        Some(person)
    }

    /// Load every lot of an auction.
    ///
    /// With a lot tab index, the already fetched page describes the first
    /// listed lot and the rest are fetched one by one. Without one, the page
    /// describes the auction's only lot.
    async fn load_lots(&self, id: &str, present: bool, single_lot: Option<Lot>) -> Result<Vec<Lot>> {
        if !present {
            return Ok(single_lot.into_iter().collect());
        }

        let body = self
            .source
            .fetch(&PageRequest::detail(DetailView::Lots, id))
            .await?;
        let first = self.parse_lot_page(&body, id)?;

        if first.lot_ids.is_empty() {
            let mut lot = single_lot.unwrap_or_else(|| Lot::new(id, DEFAULT_LOT_ID));
            first.fill(&mut lot);
            return Ok(vec![lot]);
        }

        if single_lot.is_some() {
            log::debug!("Auction {} has a lot index, ignoring general lot data", id);
        }

        let mut lots = Vec::with_capacity(first.lot_ids.len());
        let mut lot_ids = first.lot_ids.iter();

        if let Some(lot_id) = lot_ids.next() {
            let mut lot = Lot::new(id, lot_id.as_str());
            first.fill(&mut lot);
            lots.push(lot);
        }

        for lot_id in lot_ids {
            let body = self
                .source
                .fetch(&PageRequest::lot(id, lot_id.as_str()))
                .await?;
            let page = self.parse_lot_page(&body, id)?;

            let mut lot = Lot::new(id, lot_id.as_str());
            page.fill(&mut lot);
            lots.push(lot);
        }

        Ok(lots)
    }

    fn parse_lot_page(&self, body: &str, id: &str) -> Result<LotPage> {
        let document = Html::parse_document(body);
        let prefix = self.selectors.lot_tab_prefix.as_str();

        let lot_ids = document
            .select(&self.selectors.lot_tabs)
            .filter_map(|tab| tab.value().id())
            .filter_map(|tab_id| tab_id.strip_prefix(prefix))
            .map(|lot_id| lot_id.trim().to_string())
            .filter(|lot_id| !lot_id.is_empty())
            .collect();

        let kind = document
            .select(&self.selectors.lot_heading)
            .next()
            .map(element_text)
            .and_then(|heading| heading.rsplit('-').next().and_then(text));

        let summary = document
            .select(&self.selectors.lot_summary)
            .next()
            .map(element_text)
            .and_then(|s| text(&s));

        let rows = self
            .rows(&document, &self.selectors.lot_rows)
            .ok_or_else(|| AppError::structural(format!("auction {id}"), "No lot data found"))?;

        Ok(LotPage {
            lot_ids,
            kind,
            summary,
            rows,
        })
    }

    fn rows(&self, document: &Html, rows: &Selector) -> Option<Vec<Row>> {
        read_rows(
            document,
            rows,
            &self.selectors.row_header,
            &self.selectors.row_value,
        )
    }
}
