// src/error.rs

//! Unified error handling for the harvester.
//!
//! Parse-level problems (a cell that is not a valid amount, an unknown header)
//! never become an [`AppError`]; they are logged and the field stays unset.

use std::fmt;

use thiserror::Error;

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport-level failure reported by a non-reqwest page source
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// All fetch attempts for one page failed
    #[error("Could not load {url} after {attempts} attempt(s)")]
    FetchExhausted { url: String, attempts: usize },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// An expected markup region is missing from a page
    #[error("Structural error in {context}: {message}")]
    Structural { context: String, message: String },

    /// The listing produced no identifiers at all
    #[error("No auctions found in the listing")]
    EmptyListing,

    /// Every dispatched record resolution failed
    #[error("All {attempted} auction(s) failed to load")]
    AllRecordsFailed { attempted: usize },

    /// A record cannot be packed into deliverable messages
    #[error("Cannot format auction {record_id}: {message}")]
    Formatting { record_id: String, message: String },

    /// The delivery channel rejected a message
    #[error("Delivery failed for auction {record_id}: {message}")]
    Delivery { record_id: String, message: String },

    /// The messaging API answered but refused the request
    #[error("Channel rejected message: {0}")]
    Channel(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a structural error with context.
    pub fn structural(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Structural {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a transport error.
    pub fn transport(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a formatting error attributed to a record.
    pub fn formatting(record_id: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Formatting {
            record_id: record_id.into(),
            message: message.to_string(),
        }
    }

    /// Create a delivery error attributed to a record.
    pub fn delivery(record_id: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Delivery {
            record_id: record_id.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error is a transport failure eligible for retry.
    ///
    /// Body decoding and markup problems are not transport failures.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_decode(),
            Self::Transport { .. } => true,
            _ => false,
        }
    }
}
