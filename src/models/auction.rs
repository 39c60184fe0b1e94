// src/models/auction.rs

//! Auction, lot and related-party data structures.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lot id used when an auction has no multi-lot structure.
pub const DEFAULT_LOT_ID: &str = "1";

/// Listing status an auction was discovered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuctionStatus {
    Upcoming,
    Active,
}

impl AuctionStatus {
    /// Status filter code understood by the search endpoint.
    pub fn code(&self) -> &'static str {
        match self {
            AuctionStatus::Upcoming => "PU",
            AuctionStatus::Active => "EJ",
        }
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuctionStatus::Upcoming => write!(f, "upcoming"),
            AuctionStatus::Active => write!(f, "active"),
        }
    }
}

/// One harvested auction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Auction {
    /// Source-assigned identifier (e.g. "SUB-JA-2024-123456")
    pub id: String,

    /// Status at discovery time, never reinterpreted
    pub status: AuctionStatus,

    /// Auction type ("Tipo de subasta")
    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub award_procedure: Option<String>,

    /// BOE announcement reference
    #[serde(default)]
    pub announcement_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<Authority>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creditor: Option<RelatedPerson>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administrator: Option<RelatedPerson>,

    /// Owned by the record store; harvesting never sets it
    #[serde(default)]
    pub was_delivered: bool,

    #[serde(default)]
    pub lots: Vec<Lot>,
}

impl Auction {
    /// Create an empty auction as yielded by the listing.
    pub fn new(id: impl Into<String>, status: AuctionStatus) -> Self {
        Self {
            id: id.into(),
            status,
            kind: None,
            start_date: None,
            end_date: None,
            award_procedure: None,
            announcement_id: None,
            authority: None,
            creditor: None,
            administrator: None,
            was_delivered: false,
            lots: Vec::new(),
        }
    }
}

/// Managing authority of an auction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Authority {
    pub code: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
}

/// Creditor or administrator attached to an auction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RelatedPerson {
    pub name: Option<String>,
    /// Tax identifier (NIF)
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub locality: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
}

/// One sellable item within an auction, keyed by `(auction_id, id)`.
///
/// Every field the source page does not present stays `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Lot {
    pub auction_id: String,
    pub id: String,

    // Money
    pub claimed_amount: Option<Decimal>,
    pub value: Option<Decimal>,
    pub valuation: Option<Decimal>,
    pub deposit_amount: Option<Decimal>,
    pub minimum_bid: Option<Decimal>,
    pub bid_increment: Option<Decimal>,

    // Description
    pub kind: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,

    // Real estate
    pub idufir: Option<String>,
    pub cadastral_reference: Option<String>,
    pub address: Option<String>,
    pub zip_code: Option<String>,
    pub locality: Option<String>,
    pub province: Option<String>,
    pub area: Option<Decimal>,
    pub quota: Option<Decimal>,
    pub parcel: Option<String>,
    pub place_name: Option<String>,
    pub registry_reference: Option<String>,
    pub habitual_residence: Option<bool>,
    pub possessory_status: Option<String>,
    pub visitable: Option<String>,
    pub burdens: Option<String>,
    pub registry_inscription: Option<String>,
    pub legal_title: Option<String>,
    pub additional_information: Option<String>,

    // Vehicles
    pub registration_plate: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub frame_number: Option<String>,
    pub registration_date: Option<NaiveDate>,
    pub acquisition_date: Option<NaiveDate>,
    pub deposit: Option<String>,
}

impl Lot {
    /// Create an empty lot belonging to `auction_id`.
    pub fn new(auction_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            auction_id: auction_id.into(),
            id: id.into(),
            ..Self::default()
        }
    }
}
