//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{AuctionStatus, SourceSelectors};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client behavior
    #[serde(default)]
    pub http: HttpConfig,

    /// Listing crawl settings
    #[serde(default)]
    pub listing: ListingConfig,

    /// Detail resolution fan-out
    #[serde(default)]
    pub harvest: HarvestConfig,

    /// Outbound message formatting and throttling
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Record store location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Markup selectors
    #[serde(default)]
    pub selectors: SourceSelectors,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.http.max_attempts == 0 {
            return Err(AppError::validation("http.max_attempts must be > 0"));
        }
        if self.listing.statuses.is_empty() {
            return Err(AppError::validation("listing.statuses is empty"));
        }
        if self.listing.page_size == 0 {
            return Err(AppError::validation("listing.page_size must be > 0"));
        }
        if self.listing.offset_ceiling < self.listing.page_size {
            return Err(AppError::validation(
                "listing.offset_ceiling must be >= listing.page_size",
            ));
        }
        url::Url::parse(&self.listing.base_url)?;
        if self.harvest.concurrency == 0 {
            return Err(AppError::validation("harvest.concurrency must be > 0"));
        }
        if self.delivery.chunk_limit == 0 || self.delivery.chunk_limit > self.delivery.max_message_len
        {
            return Err(AppError::validation(
                "delivery.chunk_limit must be in 1..=delivery.max_message_len",
            ));
        }
        if self.delivery.batch_size == 0 {
            return Err(AppError::validation("delivery.batch_size must be > 0"));
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Attempts per page before giving up
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_attempts: defaults::max_attempts(),
        }
    }
}

/// Listing crawl settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Portal root URL
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Statuses crawled, in order
    #[serde(default = "defaults::statuses")]
    pub statuses: Vec<AuctionStatus>,

    /// Results requested per page
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// Offset at which a status crawl stops even if pages keep coming
    #[serde(default = "defaults::offset_ceiling")]
    pub offset_ceiling: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            statuses: defaults::statuses(),
            page_size: defaults::page_size(),
            offset_ceiling: defaults::offset_ceiling(),
        }
    }
}

/// Detail resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Maximum detail resolutions in flight
    #[serde(default = "defaults::concurrency")]
    pub concurrency: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            concurrency: defaults::concurrency(),
        }
    }
}

/// Outbound delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Hard size limit of the channel
    #[serde(default = "defaults::max_message_len")]
    pub max_message_len: usize,

    /// Packing limit, leaving room for the "(i de N)" prefix
    #[serde(default = "defaults::chunk_limit")]
    pub chunk_limit: usize,

    /// Minimum delay between two sends in milliseconds
    #[serde(default = "defaults::min_interval_ms")]
    pub min_interval_ms: u64,

    /// Records marked delivered and sent together
    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,

    /// Lot descriptions longer than this are truncated
    #[serde(default = "defaults::description_limit")]
    pub description_limit: usize,

    /// Prefix of the public detail page link
    #[serde(default = "defaults::detail_url")]
    pub detail_url: String,
}

impl DeliveryConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_message_len: defaults::max_message_len(),
            chunk_limit: defaults::chunk_limit(),
            min_interval_ms: defaults::min_interval_ms(),
            batch_size: defaults::batch_size(),
            description_limit: defaults::description_limit(),
            detail_url: defaults::detail_url(),
        }
    }
}

/// Record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding every known auction, relative to the storage dir
    #[serde(default = "defaults::store_file")]
    pub store_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_file: defaults::store_file(),
        }
    }
}

mod defaults {
    use crate::models::AuctionStatus;

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; harvester/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_attempts() -> usize {
        3
    }

    // Listing defaults
    pub fn base_url() -> String {
        "https://subastas.boe.es".into()
    }
    pub fn statuses() -> Vec<AuctionStatus> {
        vec![AuctionStatus::Upcoming, AuctionStatus::Active]
    }
    pub fn page_size() -> usize {
        500
    }
    pub fn offset_ceiling() -> usize {
        200_000
    }

    // Harvest defaults
    pub fn concurrency() -> usize {
        2
    }

    // Delivery defaults: 18 messages per minute stays under Telegram's 20/min
    pub fn max_message_len() -> usize {
        4096
    }
    pub fn chunk_limit() -> usize {
        4050
    }
    pub fn min_interval_ms() -> u64 {
        60_000 / 18 + 1
    }
    pub fn batch_size() -> usize {
        10
    }
    pub fn description_limit() -> usize {
        100
    }
    pub fn detail_url() -> String {
        "https://subastas.boe.es/detalleSubasta.php?idSub=".into()
    }

    // Storage defaults
    pub fn store_file() -> String {
        "auctions.json".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.harvest.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_chunk_limit_above_message_len() {
        let mut config = Config::default();
        config.delivery.chunk_limit = 5000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [listing]
            statuses = ["Active"]

            [selectors]
            search_cursor = "a.actual"
            "#,
        )
        .unwrap();

        assert_eq!(config.listing.statuses, vec![AuctionStatus::Active]);
        assert_eq!(config.listing.page_size, 500);
        assert_eq!(config.listing.offset_ceiling, 200_000);
        assert_eq!(config.harvest.concurrency, 2);
        assert_eq!(config.http.max_attempts, 3);
        assert_eq!(config.selectors.search_cursor, "a.actual");
        assert_eq!(config.selectors.row_header, "th");
        assert_eq!(config.delivery.min_interval_ms, 3334);
    }
}
