//! Carwatch Core - Foundation crate for the carwatch listing crawler.
//!
//! This crate provides the shared data model, error handling, configuration
//! management and feed-list parsing that all other carwatch crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`feeds`] - Parsing of the `channel feed_url` feed list
//! - [`types`] - Listing records, persisted listings and reconciliation events
//!
//! # Example
//!
//! ```rust
//! use carwatch_core::{parse_feeds, AppConfig};
//!
//! let config = AppConfig::default();
//! assert!(config.browser.headless);
//!
//! let list = parse_feeds("cars https://www.avto.net/Ads/results.asp?znamka=Audi\n");
//! assert_eq!(list.feeds.len(), 1);
//! assert_eq!(list.feeds[0].channel, "cars");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod feeds;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BrowserConfig, CrawlerConfig, FeedSelectors, GeneralConfig};
pub use error::{CarwatchError, ConfigError, ConfigResult};
pub use feeds::{parse_feeds, FeedList};
pub use types::{
    ChannelFeed, ExternalId, ListingId, PersistedListing, ReconciliationEvent, Record,
};
