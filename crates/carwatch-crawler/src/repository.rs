//! Persistence seam used by the orchestrator.

use crate::error::{CrawlError, Result};
use crate::reconcile::{AppliedWrite, RepositoryWrite};
use carwatch_core::{ListingId, PersistedListing, Record};
use carwatch_db::{listings, Database};
use sqlx::SqliteConnection;

/// Storage of listings and their price histories.
#[async_trait::async_trait]
pub trait ListingRepository: Send + Sync {
    /// Every known listing with its full price history.
    async fn load_all(&self) -> Result<Vec<PersistedListing>>;

    /// Store a new listing with its first price.
    async fn create(&self, record: &Record) -> Result<ListingId>;

    /// Append a price to a stored listing.
    async fn append_price(&self, listing_id: ListingId, price: i64) -> Result<()>;

    /// Commit a batch of writes, returning what was applied.
    ///
    /// The default runs the writes one by one and stops at the first
    /// failure. Implementations that can should make the batch atomic.
    async fn apply(&self, writes: &[RepositoryWrite]) -> Result<Vec<AppliedWrite>> {
        let mut applied = Vec::with_capacity(writes.len());
        for write in writes {
            applied.push(match write {
                RepositoryWrite::Create { record } => AppliedWrite::Created {
                    listing_id: self.create(record).await?,
                    external_id: record.external_id,
                    price: record.price,
                },
                RepositoryWrite::AppendPrice {
                    listing_id,
                    external_id,
                    price,
                } => {
                    self.append_price(*listing_id, *price).await?;
                    AppliedWrite::PriceAppended {
                        listing_id: *listing_id,
                        external_id: *external_id,
                        price: *price,
                    }
                }
            });
        }
        Ok(applied)
    }
}

#[async_trait::async_trait]
impl ListingRepository for Database {
    async fn load_all(&self) -> Result<Vec<PersistedListing>> {
        Ok(listings::load_all(self.pool()).await?)
    }

    async fn create(&self, record: &Record) -> Result<ListingId> {
        let mut conn = self.pool().acquire().await.map_err(repository_error)?;
        Ok(listings::create_listing(&mut conn, record).await?)
    }

    async fn append_price(&self, listing_id: ListingId, price: i64) -> Result<()> {
        let mut conn = self.pool().acquire().await.map_err(repository_error)?;
        Ok(listings::append_price(&mut conn, listing_id, price).await?)
    }

    async fn apply(&self, writes: &[RepositoryWrite]) -> Result<Vec<AppliedWrite>> {
        if writes.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.begin().await?;
        match apply_in(&mut tx, writes).await {
            Ok(applied) => {
                tx.commit().await.map_err(repository_error)?;
                tracing::debug!("Committed {} listing writes", applied.len());
                Ok(applied)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!("Rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }
}

async fn apply_in(
    conn: &mut SqliteConnection,
    writes: &[RepositoryWrite],
) -> Result<Vec<AppliedWrite>> {
    let mut applied = Vec::with_capacity(writes.len());

    for write in writes {
        match write {
            RepositoryWrite::Create { record } => {
                let listing_id = listings::create_listing(&mut *conn, record).await?;
                applied.push(AppliedWrite::Created {
                    listing_id,
                    external_id: record.external_id,
                    price: record.price,
                });
            }
            RepositoryWrite::AppendPrice {
                listing_id,
                external_id,
                price,
            } => {
                listings::append_price(&mut *conn, *listing_id, *price).await?;
                applied.push(AppliedWrite::PriceAppended {
                    listing_id: *listing_id,
                    external_id: *external_id,
                    price: *price,
                });
            }
        }
    }

    Ok(applied)
}

fn repository_error(e: sqlx::Error) -> CrawlError {
    CrawlError::Repository(e.to_string())
}
