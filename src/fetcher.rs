use crate::types::AggregatorConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Trait for pulling raw pages from the paginated auctions feed.
///
/// A failed fetch is reported as `None`, never as an error: individual page
/// failures are tolerated and skipped downstream.
#[async_trait]
pub trait FetchPages: Send + Sync {
    async fn fetch_page(&self, page: u32) -> Option<String>;
}

pub struct PageFetcher {
    client: Client,
    base_url: String,
}

impl PageFetcher {
    pub fn new(config: &AggregatorConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.clone(),
        }
    }
}

#[async_trait]
impl FetchPages for PageFetcher {
    async fn fetch_page(&self, page: u32) -> Option<String> {
        let url = format!("{}?page={}", self.base_url, page);
        debug!("Fetching auctions page {}", page);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to fetch page {}: {}", page, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Page {} returned HTTP {}", page, status);
            return None;
        }

        match response.text().await {
            Ok(body) => {
                debug!("Fetched page {} ({} bytes)", page, body.len());
                Some(body)
            }
            Err(e) => {
                warn!("Failed to read body of page {}: {}", page, e);
                None
            }
        }
    }
}
