//! Crawl error types.

use carwatch_browser::BrowserError;
use carwatch_core::ConfigError;
use carwatch_db::DatabaseError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while crawling a feed.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// A results page did not have the expected structure
    #[error("Extraction failed: {reason}")]
    Extraction {
        /// What was missing or malformed
        reason: String,
    },

    /// Moving to the next results page failed
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// Browser failure outside of a timeout
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Invalid feed URL or selector configuration
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A repository write was rejected
    #[error("Repository error: {0}")]
    Repository(String),

    /// Storage failure while loading or committing listings
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// A page operation did not finish within the page timeout
    #[error("{stage} timed out after {after:?}")]
    Timeout {
        /// Which operation timed out
        stage: &'static str,
        /// The timeout that elapsed
        after: Duration,
    },
}

impl CrawlError {
    pub(crate) fn extraction(reason: impl Into<String>) -> Self {
        Self::Extraction {
            reason: reason.into(),
        }
    }
}

/// Result type for crawl operations.
pub type Result<T> = std::result::Result<T, CrawlError>;
