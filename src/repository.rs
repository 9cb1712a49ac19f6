use crate::types::{Listing, Result, Snapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persisted store of auction listings, keyed by the feed's listing uuid.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<Listing>>;

    /// All current fixed-price listings for one item.
    async fn find_bin_listings(&self, item_id: &str) -> Result<Vec<Listing>>;

    /// Inserts a new listing. A uniqueness conflict on the uuid surfaces as an
    /// error; callers treat losing that race as "already exists".
    async fn create(&self, listing: Listing) -> Result<()>;

    async fn update_highest_bid(&self, uuid: &str, highest_bid: i64) -> Result<()>;

    /// Distinct item ids that have at least one fixed-price listing, each
    /// paired with the minimum starting bid across those listings.
    async fn lowest_bin_by_item(&self) -> Result<Vec<(String, i64)>>;
}

/// Append-only store of periodic lowest-bin price samples.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    async fn create(&self, snapshot: Snapshot) -> Result<()>;

    /// Snapshots for one item captured at or after `min_time`.
    async fn find_since(&self, item_id: &str, min_time: DateTime<Utc>) -> Result<Vec<Snapshot>>;
}
