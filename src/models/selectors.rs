// src/models/selectors.rs

//! CSS selectors for the markup regions of the auction portal.

use serde::{Deserialize, Serialize};

/// CSS selectors for scraping listing and detail pages.
///
/// Every field has a default matching the live portal, so a config file only
/// needs to override what changed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourceSelectors {
    /// "Current page" link carrying the search session id
    pub search_cursor: String,

    /// Result links in a listing page
    pub result_links: String,

    /// Tab anchors of a detail view
    pub tab_links: String,

    /// Rows of the general information table
    pub general_rows: String,

    /// Rows of the managing authority table
    pub authority_rows: String,

    /// Rows of the creditor table
    pub creditor_rows: String,

    /// Rows of the administrator table
    pub administrator_rows: String,

    /// Rows of a lot table
    pub lot_rows: String,

    /// Heading of a lot block ("Bien 1 - Inmueble")
    pub lot_heading: String,

    /// Summary box of a lot block
    pub lot_summary: String,

    /// Anchors of the per-lot tab strip
    pub lot_tabs: String,

    /// Element id prefix of a lot tab anchor
    pub lot_tab_prefix: String,

    /// Header cell within a row
    pub row_header: String,

    /// Value cell within a row
    pub row_value: String,
}

impl Default for SourceSelectors {
    fn default() -> Self {
        Self {
            search_cursor: "a.current".to_string(),
            result_links: "div.listadoResult a.resultado-busqueda-link-defecto".to_string(),
            tab_links: "div#tabs > ul > li > a".to_string(),
            general_rows: "div#idBloqueDatos1 table tr".to_string(),
            authority_rows: "div#idBloqueDatos2 table tr".to_string(),
            creditor_rows: "div#idBloqueDatos4 table tr".to_string(),
            administrator_rows: "div#idBloqueDatos7 table tr".to_string(),
            lot_rows: "div#idBloqueDatos3 table tr".to_string(),
            lot_heading: "div#idBloqueDatos3 h4".to_string(),
            lot_summary: "div#idBloqueDatos3 div.caja".to_string(),
            lot_tabs: "div#tabsver ul li a".to_string(),
            lot_tab_prefix: "idTabLote".to_string(),
            row_header: "th".to_string(),
            row_value: "td".to_string(),
        }
    }
}
