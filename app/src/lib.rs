//! Carwatch application shell
//!
//! Wires configuration, the database, the browser and the crawl
//! orchestrator together. Core business logic lives in the `crates/`
//! directory.

mod cli;

pub use cli::Cli;

use anyhow::Context;
use carwatch_browser::BrowserEngine;
use carwatch_core::{AppConfig, FeedList};
use carwatch_crawler::{CrawlOrchestrator, CrawlReport};
use carwatch_db::Database;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Initialize tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,carwatch=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Run one crawl, or crawl periodically until interrupted.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("Starting carwatch v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.load_config().context("failed to load configuration")?;

    let Some(period) = cli.interval(&config) else {
        let report = crawl_once(&config).await?;
        return print_report(&report);
    };

    info!("Crawling every {} minutes", period.as_secs() / 60);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => match crawl_once(&config).await {
                Ok(report) => print_report(&report)?,
                Err(e) => error!("Crawl failed: {:#}", e),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                return Ok(());
            }
        }
    }
}

/// Crawl every configured feed once.
///
/// Feed lines that could not be parsed are skipped and flag the report as
/// errored.
pub async fn crawl_once(config: &AppConfig) -> anyhow::Result<CrawlReport> {
    let feed_list = FeedList::load(&config.general.feeds_file).with_context(|| {
        format!(
            "failed to read feed list {}",
            config.general.feeds_file.display()
        )
    })?;

    let db = Database::new(&config.general.database_path)
        .await
        .context("failed to open database")?;
    db.run_migrations().await.context("failed to migrate database")?;
    let db = Arc::new(db);

    let engine = BrowserEngine::launch(
        &config.browser,
        Duration::from_secs(config.crawler.page_timeout_secs),
    )
    .await
    .context("failed to launch browser")?;
    let engine = Arc::new(engine);

    let orchestrator = CrawlOrchestrator::new(engine.clone(), db.clone(), config.crawler.clone())
        .with_selectors(config.selectors.clone());
    let mut report = orchestrator.run(&feed_list.feeds).await;
    report.any_error |= !feed_list.rejected.is_empty();
    drop(orchestrator);

    if let Ok(engine) = Arc::try_unwrap(engine) {
        if let Err(e) = engine.close().await {
            warn!("Failed to close browser: {}", e);
        }
    }
    if let Ok(db) = Arc::try_unwrap(db) {
        db.close().await;
    }

    Ok(report)
}

fn print_report(report: &CrawlReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
