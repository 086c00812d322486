//! Feed list parsing.
//!
//! The feed list is a plain text file with one `channel feed_url` pair per
//! line. Line order is crawl order. A malformed line only disqualifies
//! itself; the remaining feeds are still crawled.

use crate::error::{ConfigError, ConfigResult};
use crate::types::ChannelFeed;
use std::fs;
use std::path::Path;

/// Parsed feed list.
#[derive(Debug, Default)]
pub struct FeedList {
    /// Valid feeds in file order
    pub feeds: Vec<ChannelFeed>,
    /// Lines that could not be parsed
    pub rejected: Vec<ConfigError>,
}

impl FeedList {
    /// Read and parse a feed list file.
    ///
    /// # Errors
    /// Returns `ConfigError::NotFound` if the file is missing, or
    /// `ConfigError::Io` if it cannot be read. Malformed lines are collected
    /// in `rejected` instead of failing the whole file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading feed list from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Ok(parse_feeds(&contents))
    }
}

/// Parse feed list text.
///
/// Blank lines and lines starting with `#` are ignored. Every other line
/// must hold exactly two whitespace-separated fields.
#[must_use]
pub fn parse_feeds(contents: &str) -> FeedList {
    let mut list = FeedList::default();

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [channel, feed_url] => list.feeds.push(ChannelFeed::new(*channel, *feed_url)),
            other => {
                let err = ConfigError::InvalidFeedLine {
                    line: idx + 1,
                    reason: format!("expected 2 fields, got {}", other.len()),
                };
                tracing::warn!("Skipping feed: {}", err);
                list.rejected.push(err);
            }
        }
    }

    list
}

/// Check that a feed URL is an absolute http(s) URL.
///
/// # Errors
/// Returns `ConfigError::InvalidFeedUrl` otherwise.
pub fn validate_feed_url(feed_url: &str) -> ConfigResult<url::Url> {
    let parsed = url::Url::parse(feed_url).map_err(|e| ConfigError::InvalidFeedUrl {
        url: feed_url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(ConfigError::InvalidFeedUrl {
            url: feed_url.to_string(),
            reason: format!("unsupported scheme '{scheme}'"),
        }),
    }
}
