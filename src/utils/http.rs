// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::Result;
use crate::models::{HttpConfig, ListingConfig};
use crate::services::{PageRequest, PageSource};

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Page source backed by the live portal.
///
/// Performs exactly one request per call; wrap it in
/// [`RetryingSource`](crate::services::RetryingSource) for the retry budget.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    base_url: Url,
}

impl HttpPageSource {
    pub fn new(client: Client, listing: &ListingConfig) -> Result<Self> {
        Ok(Self {
            client,
            base_url: Url::parse(&listing.base_url)?,
        })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, request: &PageRequest) -> Result<String> {
        let url = request.url(&self.base_url)?;
        log::debug!("Fetching {}", url);

        let response = match request.form() {
            Some(form) => self.client.post(url).form(&form).send().await?,
            None => self.client.get(url).send().await?,
        };
        Ok(response.text().await?)
    }
}
