//! Embedded schema migrations.
//!
//! The SQL files under `migrations/` are compiled into the binary and
//! applied in version order; `SQLx` records applied versions in
//! `_sqlx_migrations`.

use crate::error::{DatabaseError, Result};
use sqlx::migrate::Migrator;
use sqlx::{Pool, Sqlite};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply every migration not yet recorded in the database.
///
/// # Errors
/// Returns `DatabaseError::Migration` if a migration fails to apply.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    let before = get_schema_version(pool).await?;

    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

    let after = get_schema_version(pool).await?;
    if after == before {
        tracing::debug!("Schema up to date at version {}", after);
    } else {
        tracing::info!("Migrated schema from version {} to {}", before, after);
    }
    Ok(())
}

/// Highest successfully applied migration version, 0 for a fresh database.
///
/// # Errors
/// Returns `DatabaseError` if the database cannot be queried.
pub async fn get_schema_version(pool: &Pool<Sqlite>) -> Result<i64> {
    let tracked: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;

    if !tracked {
        return Ok(0);
    }

    let version: Option<i64> =
        sqlx::query_scalar("SELECT MAX(version) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;
    Ok(version.unwrap_or(0))
}
