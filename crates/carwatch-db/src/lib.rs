//! Carwatch Database Layer
//!
//! Provides `SQLite` storage for listings and their price histories.
//! Uses `SQLx` with embedded, versioned migrations.
//!
//! # Example
//!
//! ```ignore
//! use carwatch_db::Database;
//!
//! let db = Database::new("carwatch.db").await?;
//! db.run_migrations().await?;
//! let known = carwatch_db::listings::load_all(db.pool()).await?;
//! ```
//!
//! # Schema
//!
//! - `listings`: one row per external id, created on first sight
//! - `prices`: append-only price history, ordered by row id

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod error;
pub mod listings;
pub mod migrations;

// Re-export commonly used types
pub use connection::DbPool;
pub use error::{DatabaseError, Result};

use std::path::Path;

/// High-level database interface with migrations.
///
/// This provides a convenient wrapper around `DbPool` that handles
/// initialization and migration.
#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the database at the specified path.
    ///
    /// # Arguments
    /// * `path` - Path to the database file (or `:memory:` for in-memory)
    ///
    /// # Errors
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let pool = DbPool::new(path).await?;
        Ok(Self { pool })
    }

    /// Run all pending database migrations.
    ///
    /// # Errors
    /// Returns `DatabaseError::Migration` if any migration fails.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(self.pool.pool()).await
    }

    /// Get the current schema version.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the version cannot be queried.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(self.pool.pool()).await
    }

    /// Get a reference to the underlying connection pool.
    ///
    /// This allows direct access to the `SQLx` pool for custom queries.
    #[must_use]
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Sqlite> {
        self.pool.pool()
    }

    /// Start a transaction; writes are discarded unless it is committed.
    pub async fn begin(&self) -> Result<sqlx::Transaction<'static, sqlx::Sqlite>> {
        Ok(self.pool.pool().begin().await?)
    }

    /// Close the database connection gracefully.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
