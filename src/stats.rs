use crate::repository::{ListingRepository, SnapshotRepository};
use crate::types::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::debug;

/// Derives price statistics from the stored listings and snapshot history.
pub struct AggregationEngine {
    listings: Arc<dyn ListingRepository>,
    snapshots: Arc<dyn SnapshotRepository>,
}

impl AggregationEngine {
    pub fn new(listings: Arc<dyn ListingRepository>, snapshots: Arc<dyn SnapshotRepository>) -> Self {
        Self { listings, snapshots }
    }

    /// Lowest starting bid across the item's current fixed-price listings,
    /// or 0 when it has none.
    pub async fn lowest_bin(&self, item_id: &str) -> Result<i64> {
        let listings = self.listings.find_bin_listings(item_id).await?;
        Ok(listings.iter().map(|l| l.starting_bid).min().unwrap_or(0))
    }

    /// Time-weighted average of the item's lowest-bin snapshots over the
    /// trailing window, or 0 when the window holds no snapshots.
    pub async fn average_lowest_bin(&self, item_id: &str, window_ms: i64) -> Result<f64> {
        let min_time = Utc::now() - Duration::milliseconds(window_ms);
        let mut snapshots = self.snapshots.find_since(item_id, min_time).await?;

        snapshots.sort_by_key(|s| s.captured_at);

        let points: Vec<(i64, f64)> = snapshots
            .iter()
            .map(|s| (s.captured_at.timestamp_millis(), s.lowest_bin as f64))
            .collect();

        debug!("Averaging {} snapshots for {}", points.len(), item_id);
        Ok(time_weighted_average(&points))
    }
}

/// Trapezoidal-rule estimate of the mean price over irregularly spaced
/// (time, price) samples, assumed sorted ascending by time.
///
/// The area under the piecewise-linear price curve is divided by the total
/// time span. A zero-span series (including a single sample) is defined as
/// its first price; an empty series is defined as 0.
pub fn time_weighted_average(points: &[(i64, f64)]) -> f64 {
    let (first, rest) = match points.split_first() {
        Some(split) => split,
        None => return 0.0,
    };

    let last = rest.last().unwrap_or(first);
    let span = last.0 - first.0;
    if span == 0 {
        return first.1;
    }

    let mut area = 0.0;
    for pair in points.windows(2) {
        let (left_time, left_price) = pair[0];
        let (right_time, right_price) = pair[1];
        area += 0.5 * (left_price + right_price) * (right_time - left_time) as f64;
    }

    area / span as f64
}
