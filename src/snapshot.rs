use crate::repository::{ListingRepository, SnapshotRepository};
use crate::types::{Result, Snapshot};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Appends one lowest-bin price sample per item that currently has at least
/// one fixed-price listing.
pub struct SnapshotJob {
    listings: Arc<dyn ListingRepository>,
    snapshots: Arc<dyn SnapshotRepository>,
}

impl SnapshotJob {
    pub fn new(listings: Arc<dyn ListingRepository>, snapshots: Arc<dyn SnapshotRepository>) -> Self {
        Self { listings, snapshots }
    }

    pub async fn run(&self) -> Result<()> {
        let items = self.listings.lowest_bin_by_item().await?;
        let captured_at = Utc::now();

        let mut written = 0usize;
        for (item_id, lowest_bin) in items {
            let snapshot = Snapshot {
                item_id: item_id.clone(),
                captured_at,
                lowest_bin,
            };
            match self.snapshots.create(snapshot).await {
                Ok(()) => written += 1,
                Err(e) => warn!("Failed to snapshot lowest bin for {}: {}", item_id, e),
            }
        }

        info!("Finished updating lowest bin snapshots: {} items", written);
        Ok(())
    }
}
