use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A normalized auction listing as persisted in the store.
///
/// Identity is the feed's `uuid`; once a uuid has been seen, subsequent
/// observations only touch `highest_bid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub uuid: String,
    pub seller_uuid: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub item_name: String,
    /// Raw base64 item payload as delivered by the feed, kept for re-decoding.
    pub item_bytes: String,
    /// Item identifier extracted from the decoded item payload; empty when the
    /// payload could not be decoded.
    pub item_id: String,
    /// True for fixed-price ("buy it now") listings.
    pub bin: bool,
    pub starting_bid: i64,
    pub highest_bid: i64,
}

/// One (item, time, price) sample of the lowest fixed-price listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub item_id: String,
    pub captured_at: DateTime<Utc>,
    pub lowest_bin: i64,
}

/// Price statistics returned to callers of `get_auction_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionStats {
    pub lowest_bin: i64,
    pub average_lowest_bin: f64,
}

/// Wire shape of one page of the auctions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AuctionsPage {
    #[serde(default)]
    pub success: bool,
    #[serde(default, rename = "totalPages")]
    pub total_pages: u32,
    #[serde(default = "default_total_auctions", rename = "totalAuctions")]
    pub total_auctions: u64,
    pub auctions: Option<Vec<RawAuction>>,
}

fn default_total_auctions() -> u64 {
    1
}

/// A single listing as it appears on the wire, before normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAuction {
    pub uuid: String,
    #[serde(default)]
    pub auctioneer: String,
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub end: i64,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub item_bytes: String,
    #[serde(default)]
    pub bin: bool,
    #[serde(default)]
    pub starting_bid: i64,
    #[serde(default)]
    pub highest_bid_amount: i64,
}

impl RawAuction {
    /// Feed timestamps are epoch milliseconds.
    pub fn start_time(&self) -> DateTime<Utc> {
        millis_to_datetime(self.start)
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        millis_to_datetime(self.end)
    }
}

pub(crate) fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// Minimum spacing between page requests.
    pub min_request_interval_ms: u64,
    /// Window used by `get_auction_data` for the time-weighted average.
    pub average_window_ms: i64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.hypixel.net/v2/skyblock/auctions".to_string(),
            user_agent: "Auction-Aggregator/1.0".to_string(),
            timeout_seconds: 30,
            min_request_interval_ms: 500,
            average_window_ms: 24 * 60 * 60 * 1000,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Page parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Listing already exists: {uuid}")]
    DuplicateListing { uuid: String },

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
