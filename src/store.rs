use crate::repository::{ListingRepository, SnapshotRepository};
use crate::types::{AggregatorError, Listing, Result, Snapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres, Row};
use tracing::debug;

/// PostgreSQL-backed [`ListingRepository`].
///
/// Schema is expected to be initialized with migrations before running; the
/// `auction_listings` table carries a unique index on `uuid`.
pub struct PgListingRepository {
    db: Pool<Postgres>,
}

impl PgListingRepository {
    pub fn new(db: Pool<Postgres>) -> Self {
        Self { db }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let db = PgPool::connect(database_url).await?;
        Ok(Self { db })
    }

    pub fn pool(&self) -> Pool<Postgres> {
        self.db.clone()
    }
}

fn row_to_listing(row: &sqlx::postgres::PgRow) -> Result<Listing> {
    Ok(Listing {
        uuid: row.try_get("uuid")?,
        seller_uuid: row.try_get("seller_uuid")?,
        start_time: row.try_get::<DateTime<Utc>, _>("start_time")?,
        end_time: row.try_get::<DateTime<Utc>, _>("end_time")?,
        item_name: row.try_get("item_name")?,
        item_bytes: row.try_get("item_bytes")?,
        item_id: row.try_get("item_id")?,
        bin: row.try_get("bin")?,
        starting_bid: row.try_get("starting_bid")?,
        highest_bid: row.try_get("highest_bid")?,
    })
}

#[async_trait]
impl ListingRepository for PgListingRepository {
    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<Listing>> {
        let row = sqlx::query("SELECT * FROM auction_listings WHERE uuid = $1")
            .bind(uuid)
            .fetch_optional(&self.db)
            .await?;

        match row {
            Some(row) => Ok(Some(row_to_listing(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_bin_listings(&self, item_id: &str) -> Result<Vec<Listing>> {
        let rows = sqlx::query("SELECT * FROM auction_listings WHERE bin = true AND item_id = $1")
            .bind(item_id)
            .fetch_all(&self.db)
            .await?;

        let mut listings = Vec::with_capacity(rows.len());
        for row in &rows {
            listings.push(row_to_listing(row)?);
        }
        Ok(listings)
    }

    async fn create(&self, listing: Listing) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO auction_listings
                (uuid, seller_uuid, start_time, end_time, item_name, item_bytes, item_id, bin, starting_bid, highest_bid)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&listing.uuid)
        .bind(&listing.seller_uuid)
        .bind(listing.start_time)
        .bind(listing.end_time)
        .bind(&listing.item_name)
        .bind(&listing.item_bytes)
        .bind(&listing.item_id)
        .bind(listing.bin)
        .bind(listing.starting_bid)
        .bind(listing.highest_bid)
        .execute(&self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                debug!("Listing {} already exists", listing.uuid);
                Err(AggregatorError::DuplicateListing {
                    uuid: listing.uuid,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_highest_bid(&self, uuid: &str, highest_bid: i64) -> Result<()> {
        sqlx::query("UPDATE auction_listings SET highest_bid = $1 WHERE uuid = $2")
            .bind(highest_bid)
            .bind(uuid)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn lowest_bin_by_item(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, MIN(starting_bid) AS lowest_bin
            FROM auction_listings
            WHERE bin = true
            GROUP BY item_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push((row.try_get("item_id")?, row.try_get("lowest_bin")?));
        }
        Ok(items)
    }
}

/// PostgreSQL-backed [`SnapshotRepository`].
pub struct PgSnapshotRepository {
    db: Pool<Postgres>,
}

impl PgSnapshotRepository {
    pub fn new(db: Pool<Postgres>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SnapshotRepository for PgSnapshotRepository {
    async fn create(&self, snapshot: Snapshot) -> Result<()> {
        sqlx::query(
            "INSERT INTO lowest_bin_snapshots (item_id, captured_at, lowest_bin) VALUES ($1, $2, $3)",
        )
        .bind(&snapshot.item_id)
        .bind(snapshot.captured_at)
        .bind(snapshot.lowest_bin)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn find_since(&self, item_id: &str, min_time: DateTime<Utc>) -> Result<Vec<Snapshot>> {
        let rows = sqlx::query(
            "SELECT item_id, captured_at, lowest_bin FROM lowest_bin_snapshots WHERE item_id = $1 AND captured_at >= $2",
        )
        .bind(item_id)
        .bind(min_time)
        .fetch_all(&self.db)
        .await?;

        let mut snapshots = Vec::with_capacity(rows.len());
        for row in &rows {
            snapshots.push(Snapshot {
                item_id: row.try_get("item_id")?,
                captured_at: row.try_get::<DateTime<Utc>, _>("captured_at")?,
                lowest_bin: row.try_get("lowest_bin")?,
            });
        }
        Ok(snapshots)
    }
}
