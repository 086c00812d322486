//! Shared types used across carwatch.
//!
//! This module defines the listing data model: identifier newtypes, the
//! per-crawl `Record` snapshot, the repository's `PersistedListing` view and
//! the `ReconciliationEvent`s handed to the notifier.

use crate::error::CarwatchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Site-assigned listing identifier, taken from the `id` query parameter of
/// the listing's detail URL. Unique within a feed; the reconciliation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(i64);

impl ExternalId {
    /// Wrap a raw site identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ExternalId {
    type Err = CarwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|e| CarwatchError::Validation(format!("invalid external id '{s}': {e}")))
    }
}

/// Repository-assigned listing identifier (stable row id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(i64);

impl ListingId {
    /// Wrap a repository row id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One crawled listing snapshot.
///
/// Created fresh on every crawl and dropped after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Site identifier parsed from the detail URL
    pub external_id: ExternalId,
    /// Listing headline
    pub title: String,
    /// First registration year
    pub year: Option<i32>,
    /// Odometer reading
    pub kilometers: Option<i64>,
    /// Gearbox type (leading token of the detail value)
    pub transmission: Option<String>,
    /// Fuel type (leading token of the detail value)
    pub fuel: Option<String>,
    /// Engine description, verbatim
    pub engine: Option<String>,
    /// Canonical absolute detail URL
    pub url: String,
    /// Observed price in whole currency units
    pub price: i64,
    /// Thumbnail URL, when the row has one
    pub image_url: Option<String>,
}

/// A listing as the repository knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedListing {
    /// Repository row id
    pub listing_id: ListingId,
    /// Site identifier, matches `Record::external_id`
    pub external_id: ExternalId,
    price_history: Vec<i64>,
}

impl PersistedListing {
    /// Build a persisted listing from its stored price history (oldest first).
    ///
    /// # Errors
    /// Returns `CarwatchError::Validation` if the history is empty.
    pub fn new(
        listing_id: ListingId,
        external_id: ExternalId,
        price_history: Vec<i64>,
    ) -> Result<Self, CarwatchError> {
        if price_history.is_empty() {
            return Err(CarwatchError::Validation(format!(
                "listing {external_id} has an empty price history"
            )));
        }
        Ok(Self {
            listing_id,
            external_id,
            price_history,
        })
    }

    /// Create the state of a listing seen for the first time.
    #[must_use]
    pub fn first_seen(listing_id: ListingId, external_id: ExternalId, price: i64) -> Self {
        Self {
            listing_id,
            external_id,
            price_history: vec![price],
        }
    }

    /// Price history, oldest first. Never empty.
    #[must_use]
    pub fn price_history(&self) -> &[i64] {
        &self.price_history
    }

    /// The last observed price.
    #[must_use]
    pub fn current_price(&self) -> i64 {
        // price_history is non-empty by construction
        self.price_history[self.price_history.len() - 1]
    }

    /// Append a newly observed price. History entries are never rewritten.
    pub fn push_price(&mut self, price: i64) {
        self.price_history.push(price);
    }
}

/// One crawl target: a feed URL and the channel its events are routed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelFeed {
    /// Notification routing key, not necessarily unique
    pub channel: String,
    /// First page of the paginated feed
    pub feed_url: String,
}

impl ChannelFeed {
    /// Create a new feed entry.
    #[must_use]
    pub fn new(channel: impl Into<String>, feed_url: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            feed_url: feed_url.into(),
        }
    }
}

/// An item worth notifying about.
///
/// Unchanged listings produce no event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconciliationEvent {
    /// First observation of this external id
    NewListing {
        /// The freshly crawled record
        record: Record,
    },
    /// Known listing whose price differs from the last stored price
    PriceChanged {
        /// The freshly crawled record; its price is the last history entry
        record: Record,
        /// Full history including the new price
        price_history: Vec<i64>,
    },
}

impl ReconciliationEvent {
    /// The record the event is about.
    #[must_use]
    pub fn record(&self) -> &Record {
        match self {
            Self::NewListing { record } | Self::PriceChanged { record, .. } => record,
        }
    }
}
