use crate::decoder::{DecodeItemTag, ListingDecoder};
use crate::fetcher::{FetchPages, PageFetcher};
use crate::pipeline::IngestionPipeline;
use crate::repository::{ListingRepository, SnapshotRepository};
use crate::snapshot::SnapshotJob;
use crate::stats::AggregationEngine;
use crate::store::{PgListingRepository, PgSnapshotRepository};
use crate::types::{AggregatorConfig, AuctionStats, Result};
use std::sync::Arc;
use tracing::{error, info};

/// Outward facade over the ingestion pipeline, snapshot job and aggregation
/// engine. All failure is absorbed internally and observable only via logs;
/// correctness across repeated runs matters more than any single run.
pub struct AuctionAggregator {
    pipeline: IngestionPipeline,
    snapshot_job: SnapshotJob,
    engine: AggregationEngine,
    config: AggregatorConfig,
}

impl AuctionAggregator {
    pub fn new(
        listings: Arc<dyn ListingRepository>,
        snapshots: Arc<dyn SnapshotRepository>,
        fetcher: Arc<dyn FetchPages>,
        tag_decoder: Arc<dyn DecodeItemTag>,
        config: AggregatorConfig,
    ) -> Self {
        let decoder = Arc::new(ListingDecoder::new(tag_decoder));
        let pipeline = IngestionPipeline::new(
            fetcher,
            listings.clone(),
            decoder,
            config.min_request_interval_ms,
        );
        let snapshot_job = SnapshotJob::new(listings.clone(), snapshots.clone());
        let engine = AggregationEngine::new(listings, snapshots);

        Self {
            pipeline,
            snapshot_job,
            engine,
            config,
        }
    }

    /// Wires the PostgreSQL repositories and the HTTP page fetcher. The tag
    /// decoder for the opaque item payload is supplied by the embedding
    /// process.
    pub async fn connect(
        database_url: &str,
        tag_decoder: Arc<dyn DecodeItemTag>,
        config: AggregatorConfig,
    ) -> Result<Self> {
        let listings = PgListingRepository::connect(database_url).await?;
        let snapshots = Arc::new(PgSnapshotRepository::new(listings.pool()));
        let fetcher = Arc::new(PageFetcher::new(&config));

        Ok(Self::new(
            Arc::new(listings),
            snapshots,
            fetcher,
            tag_decoder,
            config,
        ))
    }

    /// Runs the snapshot job and a full ingestion pass concurrently, returning
    /// once both have settled. Errors are logged, never surfaced.
    pub async fn save_auction_data(&self) {
        let (snapshot_result, ingest_result) = tokio::join!(self.snapshot_job.run(), self.pipeline.run());

        if let Err(e) = snapshot_result {
            error!("Snapshot job failed: {}", e);
        }
        if let Err(e) = ingest_result {
            error!("Ingestion pass failed: {}", e);
        }

        info!("Finished saving auctions data");
    }

    /// Current lowest bin and its time-weighted average over the configured
    /// window. Repository errors degrade to zeros.
    pub async fn get_auction_data(&self, item_id: &str) -> AuctionStats {
        let lowest_bin = match self.engine.lowest_bin(item_id).await {
            Ok(price) => price,
            Err(e) => {
                error!("Failed to read lowest bin for {}: {}", item_id, e);
                0
            }
        };

        let average_lowest_bin = match self
            .engine
            .average_lowest_bin(item_id, self.config.average_window_ms)
            .await
        {
            Ok(average) => average,
            Err(e) => {
                error!("Failed to read average lowest bin for {}: {}", item_id, e);
                0.0
            }
        };

        AuctionStats {
            lowest_bin,
            average_lowest_bin,
        }
    }
}
