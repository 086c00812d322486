//! Listing and price history operations.
//!
//! This module provides the persistence side of reconciliation: loading every
//! known listing with its price history, creating a listing on first sight and
//! appending prices. Writes take a `SqliteConnection` so callers can group
//! them in one transaction.

use crate::error::{DatabaseError, Result};
use carwatch_core::{ExternalId, ListingId, PersistedListing, Record};
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite, SqliteConnection};

/// Load every listing with its price history, oldest price first.
///
/// # Errors
/// Returns `DatabaseError::CorruptListing` if a listing has no prices, or
/// `DatabaseError::Sqlx` if the query fails.
pub async fn load_all(pool: &Pool<Sqlite>) -> Result<Vec<PersistedListing>> {
    let rows = sqlx::query(
        "SELECT l.id, l.external_id, p.price
         FROM listings l
         LEFT JOIN prices p ON p.listing_id = l.id
         ORDER BY l.id, p.id",
    )
    .fetch_all(pool)
    .await?;

    let mut grouped: Vec<(ListingId, ExternalId, Vec<i64>)> = Vec::new();
    for row in rows {
        let listing_id = ListingId::new(row.try_get("id")?);
        let external_id = ExternalId::new(row.try_get("external_id")?);
        let price: Option<i64> = row.try_get("price")?;

        match grouped.last_mut() {
            Some((id, _, history)) if *id == listing_id => history.extend(price),
            _ => grouped.push((listing_id, external_id, price.into_iter().collect())),
        }
    }

    grouped
        .into_iter()
        .map(|(listing_id, external_id, history)| {
            PersistedListing::new(listing_id, external_id, history).map_err(|e| {
                DatabaseError::CorruptListing {
                    listing_id,
                    reason: e.to_string(),
                }
            })
        })
        .collect()
}

/// Insert a newly seen listing together with its first price.
///
/// # Errors
/// Returns `DatabaseError::Sqlx` if an insert fails (e.g. the external id
/// is already stored).
pub async fn create_listing(conn: &mut SqliteConnection, record: &Record) -> Result<ListingId> {
    let accessed_at = Utc::now().to_rfc3339();

    let listing_id = sqlx::query(
        "INSERT INTO listings (external_id, url, title, accessed_at) VALUES (?, ?, ?, ?)",
    )
    .bind(record.external_id.get())
    .bind(&record.url)
    .bind(&record.title)
    .bind(&accessed_at)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    let listing_id = ListingId::new(listing_id);
    insert_price(conn, listing_id, record.price, &accessed_at).await?;

    tracing::debug!("Stored listing {} as {}", record.external_id, listing_id);
    Ok(listing_id)
}

/// Append a price to an existing listing's history.
///
/// # Errors
/// Returns `DatabaseError::ListingNotFound` if the listing doesn't exist.
pub async fn append_price(
    conn: &mut SqliteConnection,
    listing_id: ListingId,
    price: i64,
) -> Result<()> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM listings WHERE id = ?")
        .bind(listing_id.get())
        .fetch_one(&mut *conn)
        .await?
        > 0;

    if !exists {
        return Err(DatabaseError::ListingNotFound(listing_id));
    }

    insert_price(conn, listing_id, price, &Utc::now().to_rfc3339()).await
}

async fn insert_price(
    conn: &mut SqliteConnection,
    listing_id: ListingId,
    price: i64,
    accessed_at: &str,
) -> Result<()> {
    sqlx::query("INSERT INTO prices (listing_id, price, accessed_at) VALUES (?, ?, ?)")
        .bind(listing_id.get())
        .bind(price)
        .bind(accessed_at)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
