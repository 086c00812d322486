//! Command-line arguments.

use carwatch_core::{AppConfig, ConfigResult};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Crawl car-listing feeds and report new listings and price changes.
#[derive(Debug, Parser)]
#[command(name = "carwatch", version, about)]
pub struct Cli {
    /// Configuration file (default: ~/.config/carwatch/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Feed list, one `channel feed_url` pair per line
    #[arg(long, value_name = "PATH")]
    pub feeds: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Crawl once and exit, ignoring any configured interval
    #[arg(long, conflicts_with = "interval_minutes")]
    pub once: bool,

    /// Crawl repeatedly, waiting this many minutes between crawls
    #[arg(long, value_name = "MINUTES")]
    pub interval_minutes: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,
}

impl Cli {
    /// Load the configuration file and apply environment and flag overrides,
    /// in that order.
    pub fn load_config(&self) -> ConfigResult<AppConfig> {
        let config = match &self.config {
            Some(path) => AppConfig::load_from(path)?,
            None => AppConfig::load()?,
        };
        let config = self.apply(config.with_env_overrides());
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(feeds) = &self.feeds {
            config.general.feeds_file.clone_from(feeds);
        }
        if let Some(database) = &self.database {
            config.general.database_path.clone_from(database);
        }
        if let Some(minutes) = self.interval_minutes {
            config.general.interval_minutes = minutes;
        }
        if self.headful {
            config.browser.headless = false;
        }
        config
    }

    /// Time between crawls, or `None` for a single crawl.
    #[must_use]
    pub fn interval(&self, config: &AppConfig) -> Option<Duration> {
        if self.once || config.general.interval_minutes == 0 {
            return None;
        }
        Some(Duration::from_secs(
            config.general.interval_minutes.saturating_mul(60),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("carwatch").chain(args.iter().copied()))
            .expect("parse arguments")
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert!(cli.config.is_none());
        assert!(!cli.once);
        assert!(!cli.headful);
        assert_eq!(cli.interval(&AppConfig::default()), None);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = parse(&[
            "--feeds",
            "/tmp/feeds.txt",
            "--database",
            "/tmp/cars.db",
            "--interval-minutes",
            "15",
            "--headful",
        ]);

        let config = cli.apply(AppConfig::default());

        assert_eq!(config.general.feeds_file, PathBuf::from("/tmp/feeds.txt"));
        assert_eq!(config.general.database_path, PathBuf::from("/tmp/cars.db"));
        assert!(!config.browser.headless);
        assert_eq!(cli.interval(&config), Some(Duration::from_secs(900)));
    }

    #[test]
    fn test_once_wins_over_configured_interval() {
        let mut config = AppConfig::default();
        config.general.interval_minutes = 30;

        assert_eq!(parse(&[]).interval(&config), Some(Duration::from_secs(1800)));
        assert_eq!(parse(&["--once"]).interval(&config), None);
    }

    #[test]
    fn test_once_conflicts_with_interval() {
        let result = Cli::try_parse_from(["carwatch", "--once", "--interval-minutes", "5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            "[general]\nfeeds_file = \"feeds.txt\"\n\n[crawler]\nmax_pages = 10\n",
        )
        .expect("write config");

        let cli = parse(&["--config", path.to_str().expect("utf-8 path")]);
        let config = cli.load_config().expect("load config");

        assert_eq!(config.general.feeds_file, PathBuf::from("feeds.txt"));
        assert_eq!(config.crawler.max_pages, 10);
    }

    #[test]
    fn test_huge_interval_flag_is_rejected() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("config.toml");
        fs::write(&path, "").expect("write config");

        let huge = u64::MAX.to_string();
        let cli = parse(&[
            "--config",
            path.to_str().expect("utf-8 path"),
            "--interval-minutes",
            huge.as_str(),
        ]);
        assert!(cli.load_config().is_err());

        let mut config = AppConfig::default();
        config.general.interval_minutes = u64::MAX;
        assert_eq!(
            parse(&[]).interval(&config),
            Some(Duration::from_secs(u64::MAX))
        );
    }

    #[test]
    fn test_load_config_missing_file() {
        let cli = parse(&["--config", "/nonexistent/carwatch.toml"]);
        assert!(cli.load_config().is_err());
    }
}
