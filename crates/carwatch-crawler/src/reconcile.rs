//! Reconciliation of freshly crawled records against persisted listings.
//!
//! [`reconcile`] is pure: it decides events and schedules repository writes
//! but performs no I/O. The orchestrator commits the writes and folds the
//! committed result back into [`PriorState`] so later feeds of the same run
//! see it.

use carwatch_core::{ExternalId, ListingId, PersistedListing, ReconciliationEvent, Record};
use indexmap::IndexMap;
use std::collections::HashMap;

/// A repository mutation scheduled by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryWrite {
    /// Store a listing seen for the first time, with its first price
    Create { record: Record },
    /// Append a changed price to a known listing
    AppendPrice {
        listing_id: ListingId,
        external_id: ExternalId,
        price: i64,
    },
}

/// A repository mutation that has been committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedWrite {
    Created {
        listing_id: ListingId,
        external_id: ExternalId,
        price: i64,
    },
    PriceAppended {
        listing_id: ListingId,
        external_id: ExternalId,
        price: i64,
    },
}

/// Events to report and writes to commit for one feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub events: Vec<ReconciliationEvent>,
    pub writes: Vec<RepositoryWrite>,
}

/// Snapshot of every known listing, keyed by external id.
#[derive(Debug, Clone, Default)]
pub struct PriorState {
    listings: HashMap<ExternalId, PersistedListing>,
}

impl PriorState {
    #[must_use]
    pub fn from_listings(listings: impl IntoIterator<Item = PersistedListing>) -> Self {
        Self {
            listings: listings
                .into_iter()
                .map(|listing| (listing.external_id, listing))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, external_id: ExternalId) -> Option<&PersistedListing> {
        self.listings.get(&external_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Fold committed writes into the snapshot.
    pub fn apply(&mut self, applied: &[AppliedWrite]) {
        for write in applied {
            match *write {
                AppliedWrite::Created {
                    listing_id,
                    external_id,
                    price,
                } => {
                    self.listings.insert(
                        external_id,
                        PersistedListing::first_seen(listing_id, external_id, price),
                    );
                }
                AppliedWrite::PriceAppended {
                    external_id, price, ..
                } => match self.listings.get_mut(&external_id) {
                    Some(listing) => listing.push_price(price),
                    None => tracing::warn!(
                        "Price appended to listing {} missing from snapshot",
                        external_id
                    ),
                },
            }
        }
    }
}

/// Compare a feed's records with the prior state.
///
/// Records are visited in insertion order. An unknown id yields
/// `NewListing` and a `Create` write; a known id whose price differs from
/// the last recorded one yields `PriceChanged` (history already extended)
/// and an `AppendPrice` write. Known listings missing from `records` are
/// left untouched.
#[must_use]
pub fn reconcile(
    channel: &str,
    records: &IndexMap<ExternalId, Record>,
    prior: &PriorState,
) -> Reconciliation {
    let mut reconciliation = Reconciliation::default();

    for (external_id, record) in records {
        match prior.get(*external_id) {
            None => {
                tracing::info!(
                    "[{}] New listing {}: {} at {}",
                    channel,
                    external_id,
                    record.title,
                    record.price
                );
                reconciliation.writes.push(RepositoryWrite::Create {
                    record: record.clone(),
                });
                reconciliation.events.push(ReconciliationEvent::NewListing {
                    record: record.clone(),
                });
            }
            Some(listing) if listing.current_price() == record.price => {
                tracing::debug!("[{}] Listing {} unchanged", channel, external_id);
            }
            Some(listing) => {
                let mut price_history = listing.price_history().to_vec();
                price_history.push(record.price);
                tracing::info!(
                    "[{}] Price change for {}: {:?}",
                    channel,
                    external_id,
                    price_history
                );

                reconciliation.writes.push(RepositoryWrite::AppendPrice {
                    listing_id: listing.listing_id,
                    external_id: *external_id,
                    price: record.price,
                });
                reconciliation.events.push(ReconciliationEvent::PriceChanged {
                    record: record.clone(),
                    price_history,
                });
            }
        }
    }

    reconciliation
}
