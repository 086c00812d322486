//! Carwatch Crawler - crawl-and-reconcile engine for car-listing feeds.
//!
//! This crate walks paginated listing feeds in a browser page, turns every
//! result row into a [`Record`](carwatch_core::Record), and reconciles the
//! records against stored listings to find new listings and price changes.
//!
//! # Features
//!
//! - Page extraction driven by configurable CSS selectors
//! - Pagination state machine that skips failing pages and stops on
//!   repeated failures, a page cap or the crawl deadline
//! - Pure reconciliation producing events plus scheduled repository writes
//! - Per-feed transactional commits, visible to later feeds of the same run
//!
//! # Example
//!
//! ```rust,ignore
//! use carwatch_crawler::CrawlOrchestrator;
//! use std::sync::Arc;
//!
//! let orchestrator = CrawlOrchestrator::new(
//!     Arc::new(browser_engine),
//!     Arc::new(database),
//!     config.crawler.clone(),
//! )
//! .with_selectors(config.selectors.clone());
//!
//! let report = orchestrator.run(&feeds).await;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
#[allow(missing_docs)]
pub mod extractor;
pub mod orchestrator;
pub mod pagination;
#[allow(missing_docs)]
pub mod reconcile;
pub mod repository;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use error::{CrawlError, Result};
pub use extractor::{ExtractedPage, PageExtractor};
pub use orchestrator::{CrawlOrchestrator, CrawlReport, FeedOutcome};
pub use pagination::{Collected, CrawlLimits, PaginationController, StopReason};
pub use reconcile::{reconcile, AppliedWrite, PriorState, Reconciliation, RepositoryWrite};
pub use repository::ListingRepository;
