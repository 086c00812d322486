//! Configuration management for carwatch.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Longest accepted crawl interval: one year.
pub const MAX_INTERVAL_MINUTES: u64 = 365 * 24 * 60;

/// Main application configuration.
///
/// This is loaded from `~/.config/carwatch/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// File locations and scheduling
    pub general: GeneralConfig,
    /// Pagination and timeout limits
    pub crawler: CrawlerConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// CSS selectors describing the listing page structure
    pub selectors: FeedSelectors,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to
    /// defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `CARWATCH_HEADLESS`: Override browser headless mode (true/false)
    /// - `CARWATCH_FEEDS_FILE`: Override the feed list path
    /// - `CARWATCH_DATABASE`: Override the database path
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("CARWATCH_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("CARWATCH_FEEDS_FILE") {
            tracing::debug!("Override general.feeds_file from env: {}", val);
            self.general.feeds_file = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("CARWATCH_DATABASE") {
            tracing::debug!("Override general.database_path from env: {}", val);
            self.general.database_path = PathBuf::from(val);
        }

        self
    }

    /// Reject values that would make the crawler loop or stall.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.crawler.max_pages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "crawler.max_pages".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.crawler.page_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "crawler.page_timeout_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.general.interval_minutes > MAX_INTERVAL_MINUTES {
            return Err(ConfigError::InvalidValue {
                field: "general.interval_minutes".to_string(),
                reason: format!("must be at most {MAX_INTERVAL_MINUTES}"),
            });
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/carwatch/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("net", "carwatch", "carwatch").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// File locations and scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Feed list, one `channel feed_url` pair per line
    pub feeds_file: PathBuf,
    /// `SQLite` database file
    pub database_path: PathBuf,
    /// Minutes between crawls when running periodically (0 = run once)
    pub interval_minutes: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            feeds_file: PathBuf::from("config.txt"),
            database_path: PathBuf::from("carwatch.db"),
            interval_minutes: 0,
        }
    }
}

/// Pagination and timeout limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Timeout for a single navigation, click or page extraction
    pub page_timeout_secs: u64,
    /// Deadline for a whole crawl across all feeds (0 = none)
    pub crawl_deadline_secs: u64,
    /// Consecutive failed pages tolerated before a feed is abandoned
    pub max_consecutive_failures: u32,
    /// Upper bound on pages visited per feed
    pub max_pages: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_timeout_secs: 30,
            crawl_deadline_secs: 1800,
            max_consecutive_failures: 3,
            max_pages: 200,
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// User agent sent with every page
    pub user_agent: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// CSS selectors describing the structure of a results page.
///
/// Row-level selectors are evaluated inside one result row; price
/// selectors inside the row's price group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSelectors {
    /// Button that declines the cookie consent overlay
    pub cookie_decline: String,
    /// One result row
    pub result_row: String,
    /// Listing headline
    pub title: String,
    /// Thumbnail image
    pub image: String,
    /// Rows of the details table
    pub detail_rows: String,
    /// Label and value cells of a details row
    pub detail_cells: String,
    /// Link to the detail page
    pub detail_link: String,
    /// Container of the price elements
    pub price_group: String,
    /// Present inside the price group when the listing is on sale
    pub sale_marker: String,
    /// Discounted price
    pub sale_price: String,
    /// Regular price
    pub regular_price: String,
    /// Pagination "next" control
    pub next_page: String,
    /// Pagination "next" control in its disabled state
    pub next_page_disabled: String,
}

impl Default for FeedSelectors {
    fn default() -> Self {
        Self {
            cookie_decline: "#CybotCookiebotDialogBodyButtonDecline".to_string(),
            result_row: "#results > div.GO-Results-Row".to_string(),
            title: "div.GO-Results-Naziv > span".to_string(),
            image: "div.GO-Results-Photo img".to_string(),
            detail_rows: "div.GO-Results-Data table tr".to_string(),
            detail_cells: "td".to_string(),
            detail_link: "a.stretched-link".to_string(),
            price_group: "div.GO-Results-PriceLogo".to_string(),
            sale_marker: "div.GO-Results-Price-Akcija".to_string(),
            sale_price: "div.GO-Results-Price-TXT-AkcijaCena".to_string(),
            regular_price: "div.GO-Results-Price-TXT-Regular".to_string(),
            next_page: "#GO-naviprevnext > li.GO-Rounded-R".to_string(),
            next_page_disabled: "#GO-naviprevnext > li.GO-Rounded-R.disabled".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.general.feeds_file, PathBuf::from("config.txt"));
        assert_eq!(config.crawler.max_consecutive_failures, 3);
        assert_eq!(config.crawler.page_timeout_secs, 30);
        assert!(config.browser.headless);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[crawler]"));
        assert!(toml_str.contains("[selectors]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.selectors, config.selectors);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r##"
[crawler]
max_pages = 10

[selectors]
result_row = "#list > .row"
"##;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.crawler.max_pages, 10);
        assert_eq!(config.selectors.result_row, "#list > .row");
        // These should be defaults
        assert_eq!(config.crawler.page_timeout_secs, 30);
        assert_eq!(
            config.selectors.next_page,
            FeedSelectors::default().next_page
        );
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");
        fs::write(
            &config_path,
            "[general]\nfeeds_file = \"feeds.txt\"\ninterval_minutes = 15\n",
        )
        .expect("write config file");

        let config = AppConfig::load_from(&config_path).expect("load config");
        assert_eq!(config.general.feeds_file, PathBuf::from("feeds.txt"));
        assert_eq!(config.general.interval_minutes, 15);
    }

    #[test]
    fn test_load_from_rejects_zero_page_limit() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");
        fs::write(&config_path, "[crawler]\nmax_pages = 0\n").expect("write config file");

        let result = AppConfig::load_from(&config_path);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_load_from_rejects_huge_interval() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");
        fs::write(
            &config_path,
            "[general]\ninterval_minutes = 9223372036854775807\n",
        )
        .expect("write config file");

        let result = AppConfig::load_from(&config_path);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "general.interval_minutes"
        ));
    }

    #[test]
    fn test_load_from_missing_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let result = AppConfig::load_from(&tmp.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }
}
