#![allow(dead_code)]

use async_trait::async_trait;
use auction_aggregator::types::{AggregatorError, Listing, Result, Snapshot};
use auction_aggregator::{DecodeItemTag, FetchPages, ListingRepository, SnapshotRepository};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory stand-in for the Postgres listing store. Tracks create/update
/// counts so tests can distinguish insert from update paths.
#[derive(Default)]
pub struct MemoryListingRepository {
    listings: Mutex<HashMap<String, Listing>>,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
}

impl MemoryListingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.listings.lock().unwrap().len()
    }

    pub fn get(&self, uuid: &str) -> Option<Listing> {
        self.listings.lock().unwrap().get(uuid).cloned()
    }

    pub fn insert(&self, listing: Listing) {
        self.listings.lock().unwrap().insert(listing.uuid.clone(), listing);
    }
}

#[async_trait]
impl ListingRepository for MemoryListingRepository {
    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<Listing>> {
        Ok(self.listings.lock().unwrap().get(uuid).cloned())
    }

    async fn find_bin_listings(&self, item_id: &str) -> Result<Vec<Listing>> {
        Ok(self
            .listings
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.bin && l.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn create(&self, listing: Listing) -> Result<()> {
        let mut listings = self.listings.lock().unwrap();
        if listings.contains_key(&listing.uuid) {
            return Err(AggregatorError::DuplicateListing {
                uuid: listing.uuid,
            });
        }
        self.creates.fetch_add(1, Ordering::SeqCst);
        listings.insert(listing.uuid.clone(), listing);
        Ok(())
    }

    async fn update_highest_bid(&self, uuid: &str, highest_bid: i64) -> Result<()> {
        let mut listings = self.listings.lock().unwrap();
        if let Some(listing) = listings.get_mut(uuid) {
            listing.highest_bid = highest_bid;
            self.updates.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn lowest_bin_by_item(&self) -> Result<Vec<(String, i64)>> {
        let listings = self.listings.lock().unwrap();
        let mut lowest: HashMap<String, i64> = HashMap::new();
        for listing in listings.values().filter(|l| l.bin) {
            lowest
                .entry(listing.item_id.clone())
                .and_modify(|price| *price = (*price).min(listing.starting_bid))
                .or_insert(listing.starting_bid);
        }
        Ok(lowest.into_iter().collect())
    }
}

#[derive(Default)]
pub struct MemorySnapshotRepository {
    snapshots: Mutex<Vec<Snapshot>>,
}

impl MemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }

    pub fn all(&self) -> Vec<Snapshot> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn insert(&self, snapshot: Snapshot) {
        self.snapshots.lock().unwrap().push(snapshot);
    }
}

#[async_trait]
impl SnapshotRepository for MemorySnapshotRepository {
    async fn create(&self, snapshot: Snapshot) -> Result<()> {
        self.snapshots.lock().unwrap().push(snapshot);
        Ok(())
    }

    async fn find_since(&self, item_id: &str, min_time: DateTime<Utc>) -> Result<Vec<Snapshot>> {
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.item_id == item_id && s.captured_at >= min_time)
            .cloned()
            .collect())
    }
}

/// Serves canned page bodies; out-of-range pages behave like transport
/// failures.
pub struct StubFeed {
    pages: Vec<Option<String>>,
}

impl StubFeed {
    pub fn new(pages: Vec<Option<String>>) -> Self {
        Self { pages }
    }
}

#[async_trait]
impl FetchPages for StubFeed {
    async fn fetch_page(&self, page: u32) -> Option<String> {
        self.pages.get(page as usize).cloned().flatten()
    }
}

/// Tag decoder that reads the payload as plain JSON, mirroring the shape the
/// production NBT decoder produces.
pub struct JsonTagDecoder;

impl DecodeItemTag for JsonTagDecoder {
    fn decode_tag(&self, bytes: &[u8]) -> Option<Value> {
        serde_json::from_slice(bytes).ok()
    }
}

/// Base64 payload whose decoded tag tree carries the given item id at the
/// path the decoder extracts.
pub fn item_bytes_for(item_id: &str) -> String {
    let tag = json!({ "i": [{ "tag": { "ExtraAttributes": { "id": item_id } } }] });
    STANDARD.encode(tag.to_string())
}

pub fn raw_auction(uuid: &str, item_id: &str, bin: bool, starting_bid: i64, highest_bid: i64) -> Value {
    json!({
        "uuid": uuid,
        "auctioneer": "seller-1",
        "start": 1_700_000_000_000i64,
        "end": 1_700_086_400_000i64,
        "item_name": item_id,
        "item_bytes": item_bytes_for(item_id),
        "bin": bin,
        "starting_bid": starting_bid,
        "highest_bid_amount": highest_bid,
    })
}

pub fn page_json(success: bool, total_pages: u32, auctions: Option<Vec<Value>>) -> String {
    let mut page = json!({
        "success": success,
        "totalPages": total_pages,
        "totalAuctions": auctions.as_ref().map(|a| a.len()).unwrap_or(0),
    });
    if let Some(auctions) = auctions {
        page["auctions"] = Value::Array(auctions);
    }
    page.to_string()
}

pub fn bin_listing(uuid: &str, item_id: &str, starting_bid: i64) -> Listing {
    Listing {
        uuid: uuid.to_string(),
        seller_uuid: "seller-1".to_string(),
        start_time: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        end_time: Utc.timestamp_millis_opt(1_700_086_400_000).unwrap(),
        item_name: item_id.to_string(),
        item_bytes: item_bytes_for(item_id),
        item_id: item_id.to_string(),
        bin: true,
        starting_bid,
        highest_bid: 0,
    }
}
