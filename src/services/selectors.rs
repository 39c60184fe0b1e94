//! Compiled markup selectors.
//!
//! Parses the configured [`SourceSelectors`] once so crawls never re-parse
//! selector strings per page.

use scraper::Selector;

use crate::error::{AppError, Result};
use crate::models::SourceSelectors;

/// Parsed selectors shared by the listing crawler and detail resolver.
#[derive(Debug, Clone)]
pub struct Selectors {
    pub search_cursor: Selector,
    pub result_links: Selector,
    pub tab_links: Selector,
    pub general_rows: Selector,
    pub authority_rows: Selector,
    pub creditor_rows: Selector,
    pub administrator_rows: Selector,
    pub lot_rows: Selector,
    pub lot_heading: Selector,
    pub lot_summary: Selector,
    pub lot_tabs: Selector,
    pub lot_tab_prefix: String,
    pub row_header: Selector,
    pub row_value: Selector,
}

impl Selectors {
    /// Compile every configured selector, failing on the first invalid one.
    pub fn compile(source: &SourceSelectors) -> Result<Self> {
        Ok(Self {
            search_cursor: parse_selector(&source.search_cursor)?,
            result_links: parse_selector(&source.result_links)?,
            tab_links: parse_selector(&source.tab_links)?,
            general_rows: parse_selector(&source.general_rows)?,
            authority_rows: parse_selector(&source.authority_rows)?,
            creditor_rows: parse_selector(&source.creditor_rows)?,
            administrator_rows: parse_selector(&source.administrator_rows)?,
            lot_rows: parse_selector(&source.lot_rows)?,
            lot_heading: parse_selector(&source.lot_heading)?,
            lot_summary: parse_selector(&source.lot_summary)?,
            lot_tabs: parse_selector(&source.lot_tabs)?,
            lot_tab_prefix: source.lot_tab_prefix.clone(),
            row_header: parse_selector(&source.row_header)?,
            row_value: parse_selector(&source.row_value)?,
        })
    }
}

impl Default for Selectors {
    fn default() -> Self {
        // The built-in selector strings are covered by `test_default_compiles`.
        Self::compile(&SourceSelectors::default()).expect("default selectors are valid")
    }
}

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
