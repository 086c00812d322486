//! Crawl orchestrator for running every configured feed once.
//!
//! This module provides the `CrawlOrchestrator` which walks the feeds in
//! their configured order, reconciles each feed against the listings known
//! so far and commits the resulting writes before moving to the next feed.

use crate::error::Result;
use crate::extractor::PageExtractor;
use crate::pagination::{CrawlLimits, PaginationController, StopReason};
use crate::reconcile::{reconcile, PriorState};
use crate::repository::ListingRepository;
use carwatch_browser::{PageActions, PageFactory};
use carwatch_core::{ChannelFeed, CrawlerConfig, FeedSelectors, ReconciliationEvent};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Result of crawling a single feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedOutcome {
    /// Channel the feed reports to
    pub channel: String,
    /// Feed URL as configured
    pub feed_url: String,
    /// Distinct listings collected
    pub listings: usize,
    /// Extraction attempts made
    pub pages_visited: u32,
    /// Events emitted for this feed
    pub events: usize,
    /// Why pagination stopped, if it ran
    pub stop: Option<StopReason>,
    /// Whether anything went wrong
    pub had_error: bool,
    /// Error that ended the feed early
    pub error: Option<String>,
}

impl FeedOutcome {
    fn new(feed: &ChannelFeed) -> Self {
        Self {
            channel: feed.channel.clone(),
            feed_url: feed.feed_url.clone(),
            listings: 0,
            pages_visited: 0,
            events: 0,
            stop: None,
            had_error: false,
            error: None,
        }
    }
}

/// Everything a crawl run hands to the notifier.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlReport {
    /// Events per channel, channels in first-configured order
    pub batches: IndexMap<String, Vec<ReconciliationEvent>>,
    /// Set when any feed had an error
    pub any_error: bool,
    /// Per-feed summary, in configured order
    pub feeds: Vec<FeedOutcome>,
}

impl CrawlReport {
    /// Total number of events across all channels.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.batches.values().map(Vec::len).sum()
    }
}

/// Orchestrates crawling across all configured feeds.
pub struct CrawlOrchestrator<F, R> {
    /// Source of browser pages
    pages: Arc<F>,
    /// Listing storage
    repository: Arc<R>,
    /// Timeouts and pagination bounds
    config: CrawlerConfig,
    /// Selectors handed to every extractor
    selectors: FeedSelectors,
}

impl<F, R> CrawlOrchestrator<F, R>
where
    F: PageFactory,
    R: ListingRepository,
{
    /// Create a new crawl orchestrator.
    #[must_use]
    pub fn new(pages: Arc<F>, repository: Arc<R>, config: CrawlerConfig) -> Self {
        Self {
            pages,
            repository,
            config,
            selectors: FeedSelectors::default(),
        }
    }

    /// Use custom selectors instead of the defaults.
    #[must_use]
    pub fn with_selectors(mut self, selectors: FeedSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Crawl every feed once, in order.
    ///
    /// The run never fails as a whole: feed failures are recorded in the
    /// report and the remaining feeds still run. Every channel gets a
    /// batch, possibly empty.
    pub async fn run(&self, feeds: &[ChannelFeed]) -> CrawlReport {
        let mut report = CrawlReport::default();
        for feed in feeds {
            report.batches.entry(feed.channel.clone()).or_default();
        }

        let mut prior = match self.repository.load_all().await {
            Ok(listings) => PriorState::from_listings(listings),
            Err(e) => {
                tracing::error!("Failed to load known listings: {}", e);
                report.any_error = true;
                return report;
            }
        };

        let deadline = Some(self.config.crawl_deadline_secs)
            .filter(|secs| *secs > 0)
            .and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs)));
        let limits = CrawlLimits::from_config(&self.config, deadline);

        tracing::info!(
            "Crawling {} feeds against {} known listings",
            feeds.len(),
            prior.len()
        );

        for feed in feeds {
            let mut outcome = FeedOutcome::new(feed);

            match self.crawl_feed(feed, limits, &mut prior, &mut outcome).await {
                Ok(events) => {
                    outcome.events = events.len();
                    report
                        .batches
                        .entry(feed.channel.clone())
                        .or_default()
                        .extend(events);
                }
                Err(e) => {
                    tracing::error!("Feed {} ({}) failed: {}", feed.feed_url, feed.channel, e);
                    outcome.had_error = true;
                    outcome.error = Some(e.to_string());
                }
            }

            report.any_error |= outcome.had_error;
            report.feeds.push(outcome);
        }

        tracing::info!(
            "Crawl finished: {} events, errors: {}",
            report.event_count(),
            report.any_error
        );

        report
    }

    /// Crawl one feed and commit its writes. Events are only returned once
    /// the writes behind them are committed.
    async fn crawl_feed(
        &self,
        feed: &ChannelFeed,
        limits: CrawlLimits,
        prior: &mut PriorState,
        outcome: &mut FeedOutcome,
    ) -> Result<Vec<ReconciliationEvent>> {
        let extractor = PageExtractor::new(self.selectors.clone(), &feed.feed_url)?;

        let page = self.pages.open_page().await?;
        let collected = PaginationController::new(&extractor, limits)
            .collect(&page, &feed.feed_url)
            .await;
        if let Err(e) = page.close().await {
            tracing::warn!("Failed to close page for {}: {}", feed.feed_url, e);
        }
        let collected = collected?;

        outcome.listings = collected.records.len();
        outcome.pages_visited = collected.pages_visited;
        outcome.stop = Some(collected.stop);
        outcome.had_error = collected.had_error;

        let reconciliation = reconcile(&feed.channel, &collected.records, prior);
        let applied = self.repository.apply(&reconciliation.writes).await?;
        prior.apply(&applied);

        Ok(reconciliation.events)
    }
}
