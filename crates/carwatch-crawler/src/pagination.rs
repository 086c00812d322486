//! Pagination controller: walks a feed page by page and accumulates records.
//!
//! The controller is an explicit state machine over one open page. A page
//! that fails to extract is flagged and skipped by advancing past it; the
//! loop only ends when a page reports no further pages or one of the
//! [`CrawlLimits`] trips.

use crate::error::{CrawlError, Result};
use crate::extractor::PageExtractor;
use carwatch_browser::PageActions;
use carwatch_core::{CrawlerConfig, ExternalId, Record};
use indexmap::IndexMap;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Why the controller stopped walking a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The last extracted page reported no further pages
    Exhausted,
    /// Too many failures in a row
    RetriesExhausted,
    /// The per-feed page cap was reached
    PageLimit,
    /// The crawl deadline passed
    Deadline,
}

impl StopReason {
    /// Whether stopping for this reason means the feed was not fully walked.
    #[must_use]
    pub fn is_failure(self) -> bool {
        !matches!(self, Self::Exhausted)
    }
}

/// Bounds on a single feed walk.
#[derive(Debug, Clone, Copy)]
pub struct CrawlLimits {
    /// Timeout for each navigation, click and extraction
    pub page_timeout: Duration,
    /// Failures in a row after which the feed is abandoned
    pub max_consecutive_failures: u32,
    /// Maximum number of extraction attempts per feed
    pub max_pages: u32,
    /// Point in time after which no further page is started
    pub deadline: Option<Instant>,
}

impl CrawlLimits {
    /// Limits from the `[crawler]` configuration section.
    #[must_use]
    pub fn from_config(config: &CrawlerConfig, deadline: Option<Instant>) -> Self {
        Self {
            page_timeout: Duration::from_secs(config.page_timeout_secs),
            max_consecutive_failures: config.max_consecutive_failures.max(1),
            max_pages: config.max_pages.max(1),
            deadline,
        }
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default(), None)
    }
}

/// Everything collected from one feed.
#[derive(Debug, Clone)]
pub struct Collected {
    /// Records keyed by external id; later pages overwrite earlier ones
    pub records: IndexMap<ExternalId, Record>,
    /// Set when any page failed or the walk was cut short
    pub had_error: bool,
    /// Number of extraction attempts
    pub pages_visited: u32,
    /// Why the walk ended
    pub stop: StopReason,
}

#[derive(Debug)]
enum PageState {
    Fetching,
    Extracting,
    Advancing,
    Errored(CrawlError),
    Done(StopReason),
}

/// Drives a [`PageExtractor`] across the pages of one feed.
#[derive(Debug)]
pub struct PaginationController<'a> {
    extractor: &'a PageExtractor,
    limits: CrawlLimits,
}

impl<'a> PaginationController<'a> {
    /// Create a controller for one feed.
    #[must_use]
    pub fn new(extractor: &'a PageExtractor, limits: CrawlLimits) -> Self {
        Self { extractor, limits }
    }

    /// Load `start_url` and extract pages until the feed is exhausted.
    ///
    /// Only a failure to load the first page is returned as an error. Later
    /// failures are recorded in [`Collected::had_error`] and the records of
    /// the pages that succeeded are kept.
    pub async fn collect<P: PageActions>(&self, page: &P, start_url: &str) -> Result<Collected> {
        let mut records = IndexMap::new();
        let mut had_error = false;
        let mut has_more_pages = true;
        let mut consecutive_failures = 0u32;
        let mut pages_visited = 0u32;
        let mut state = PageState::Fetching;

        let stop = loop {
            state = match state {
                PageState::Fetching if self.limits.deadline_passed() => {
                    PageState::Done(StopReason::Deadline)
                }
                PageState::Fetching => {
                    tracing::info!("Loading feed {}", start_url);
                    self.guarded("navigation", page.navigate(start_url)).await?;
                    PageState::Extracting
                }
                PageState::Extracting => match self.exceeded(pages_visited) {
                    Some(reason) => PageState::Done(reason),
                    None => {
                        pages_visited += 1;
                        match self.guarded("extraction", self.extractor.extract(page)).await {
                            Ok(extracted) => {
                                consecutive_failures = 0;
                                has_more_pages = extracted.has_more_pages;
                                tracing::debug!(
                                    "Page {} of {}: {} listings",
                                    pages_visited,
                                    start_url,
                                    extracted.records.len()
                                );
                                records.extend(extracted.records);
                                if has_more_pages {
                                    PageState::Advancing
                                } else {
                                    PageState::Done(StopReason::Exhausted)
                                }
                            }
                            Err(e) => PageState::Errored(e),
                        }
                    }
                },
                PageState::Advancing => match self.exceeded(pages_visited) {
                    Some(reason) => PageState::Done(reason),
                    None => match self.advance(page).await {
                        Ok(()) => PageState::Extracting,
                        Err(e) => PageState::Errored(e),
                    },
                },
                PageState::Errored(e) => {
                    had_error = true;
                    consecutive_failures += 1;
                    tracing::error!("Page {} of {} failed: {}", pages_visited, start_url, e);

                    if consecutive_failures >= self.limits.max_consecutive_failures {
                        PageState::Done(StopReason::RetriesExhausted)
                    } else if has_more_pages {
                        PageState::Advancing
                    } else {
                        PageState::Done(StopReason::Exhausted)
                    }
                }
                PageState::Done(reason) => break reason,
            };
        };

        if stop.is_failure() {
            had_error = true;
            tracing::error!(
                "Stopped {} after {} pages: {:?}",
                start_url,
                pages_visited,
                stop
            );
        }

        tracing::info!(
            "Collected {} listings from {} ({} pages)",
            records.len(),
            start_url,
            pages_visited
        );

        Ok(Collected {
            records,
            had_error,
            pages_visited,
            stop,
        })
    }

    fn exceeded(&self, pages_visited: u32) -> Option<StopReason> {
        if self.limits.deadline_passed() {
            Some(StopReason::Deadline)
        } else if pages_visited >= self.limits.max_pages {
            Some(StopReason::PageLimit)
        } else {
            None
        }
    }

    async fn advance<P: PageActions>(&self, page: &P) -> Result<()> {
        let next = &self.extractor.selectors().next_page;
        tracing::debug!("Advancing to next page");

        self.guarded("advance", page.click(next))
            .await
            .map_err(|e| CrawlError::Navigation(format!("next page: {e}")))?;
        self.guarded("page load", page.wait_until_loaded()).await
    }

    async fn guarded<T, E, F>(&self, stage: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<CrawlError>,
    {
        let after = self.limits.page_timeout;
        match tokio::time::timeout(after, fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(CrawlError::Timeout { stage, after }),
        }
    }
}
