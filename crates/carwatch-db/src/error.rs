//! Database error types.

use carwatch_core::ListingId;
use thiserror::Error;

/// Errors raised by the listing store.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The database file could not be opened or created.
    #[error("failed to open database: {0}")]
    Open(String),

    /// Applying the embedded schema migrations failed.
    #[error("migration failed: {0}")]
    Migration(String),

    /// A price was appended to a listing that is not stored.
    #[error("listing {0} not found")]
    ListingNotFound(ListingId),

    /// Stored rows do not form a valid listing.
    #[error("listing {listing_id} is corrupt: {reason}")]
    CorruptListing {
        /// Row id of the listing
        listing_id: ListingId,
        /// What is wrong with the stored rows
        reason: String,
    },

    /// Underlying `SQLx` error.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Result type alias for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
