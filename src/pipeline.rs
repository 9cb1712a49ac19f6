use crate::decoder::ListingDecoder;
use crate::fetcher::FetchPages;
use crate::rate_limit::remaining_delay;
use crate::repository::ListingRepository;
use crate::types::{AuctionsPage, RawAuction, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Walks the paginated auctions feed and reconciles every listing against the
/// store: known uuids get their highest bid refreshed, unknown ones are
/// decoded and inserted.
///
/// Pages are fetched strictly in sequence under the configured rate limit;
/// per-listing repository writes are issued into a task set and joined once
/// at the end of the run.
pub struct IngestionPipeline {
    fetcher: Arc<dyn FetchPages>,
    listings: Arc<dyn ListingRepository>,
    decoder: Arc<ListingDecoder>,
    min_request_interval: Duration,
}

impl IngestionPipeline {
    pub fn new(
        fetcher: Arc<dyn FetchPages>,
        listings: Arc<dyn ListingRepository>,
        decoder: Arc<ListingDecoder>,
        min_request_interval_ms: u64,
    ) -> Self {
        Self {
            fetcher,
            listings,
            decoder,
            min_request_interval: Duration::from_millis(min_request_interval_ms),
        }
    }

    /// Runs one full ingestion pass. A failed or unsuccessful first page
    /// aborts the pass; any later page failure only skips that page. The
    /// pass completes only once every issued write has settled.
    pub async fn run(&self) -> Result<()> {
        info!("Updating auction data");

        let first_page = match self.fetch_parsed(0).await {
            Some(page) => page,
            None => {
                warn!("First auctions page unavailable, aborting ingestion pass");
                return Ok(());
            }
        };
        if !first_page.success {
            warn!("Auctions feed reported failure on page 0, aborting ingestion pass");
            return Ok(());
        }

        let total_pages = first_page.total_pages;
        let total_auctions = first_page.total_auctions;
        debug!("Feed reports {} pages, {} auctions", total_pages, total_auctions);

        let mut writes: JoinSet<()> = JoinSet::new();
        let mut last_request = Instant::now();
        let mut listings_seen = 0usize;

        for page in 0..total_pages {
            if let Some(delay) = remaining_delay(last_request, self.min_request_interval, Instant::now()) {
                debug!("Rate limiting before page {}: waiting {:?}", page, delay);
                tokio::time::sleep(delay).await;
            }

            let body = self.fetcher.fetch_page(page).await;
            last_request = Instant::now();

            let body = match body {
                Some(body) => body,
                None => continue,
            };

            let parsed: AuctionsPage = match serde_json::from_str(&body) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Skipping unparseable page {}: {}", page, e);
                    continue;
                }
            };
            if !parsed.success {
                warn!("Feed reported failure on page {}, skipping", page);
                continue;
            }

            let auctions = match parsed.auctions {
                Some(auctions) => auctions,
                None => {
                    debug!("Page {} carries no auctions array, skipping", page);
                    continue;
                }
            };

            listings_seen += auctions.len();
            for raw in auctions {
                let listings = self.listings.clone();
                let decoder = self.decoder.clone();
                writes.spawn(async move {
                    reconcile_listing(listings, decoder, raw).await;
                });
            }
        }

        // The run only reports complete once every issued write has finished.
        let mut settled = 0usize;
        while let Some(joined) = writes.join_next().await {
            if joined.is_ok() {
                settled += 1;
            }
        }

        info!(
            "Finished saving auctions table: {} listings seen, {} writes settled",
            listings_seen, settled
        );
        Ok(())
    }

    async fn fetch_parsed(&self, page: u32) -> Option<AuctionsPage> {
        let body = self.fetcher.fetch_page(page).await?;
        match serde_json::from_str(&body) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Failed to parse page {}: {}", page, e);
                None
            }
        }
    }
}

/// Reconciles one raw feed listing against the store. Failures are absorbed
/// here: a lost create race converges on the next pass via the update path.
async fn reconcile_listing(
    listings: Arc<dyn ListingRepository>,
    decoder: Arc<ListingDecoder>,
    raw: RawAuction,
) {
    match listings.find_by_uuid(&raw.uuid).await {
        Ok(Some(_)) => {
            if let Err(e) = listings.update_highest_bid(&raw.uuid, raw.highest_bid_amount).await {
                warn!("Failed to update highest bid for {}: {}", raw.uuid, e);
            }
        }
        Ok(None) => {
            let listing = decoder.normalize(&raw);
            if let Err(e) = listings.create(listing).await {
                debug!("Suppressed create failure for {}: {}", raw.uuid, e);
            }
        }
        Err(e) => {
            warn!("Lookup failed for listing {}: {}", raw.uuid, e);
        }
    }
}
