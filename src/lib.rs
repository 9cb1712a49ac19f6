pub mod types;
pub mod rate_limit;
pub mod fetcher;
pub mod decoder;
pub mod repository;
pub mod store;
pub mod pipeline;
pub mod snapshot;
pub mod stats;
pub mod aggregator;

pub use types::*;
pub use fetcher::{FetchPages, PageFetcher};
pub use decoder::{DecodeItemTag, ListingDecoder};
pub use repository::{ListingRepository, SnapshotRepository};
pub use store::{PgListingRepository, PgSnapshotRepository};
pub use pipeline::IngestionPipeline;
pub use snapshot::SnapshotJob;
pub use stats::AggregationEngine;
pub use aggregator::AuctionAggregator;
