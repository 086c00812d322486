use carwatch_browser::BrowserEngine;
use carwatch_core::{BrowserConfig, ChannelFeed, CrawlerConfig, ReconciliationEvent};
use carwatch_crawler::{CrawlOrchestrator, ListingRepository};
use carwatch_db::Database;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
#[ignore = "Requires Chrome browser to be installed"]
async fn test_live_crawl_is_idempotent() {
    let db = Database::new(":memory:").await.expect("create db");
    db.run_migrations().await.expect("run migrations");
    let db = Arc::new(db);

    let engine = BrowserEngine::launch(&BrowserConfig::default(), Duration::from_secs(30))
        .await
        .expect("launch browser");
    let engine = Arc::new(engine);

    let config = CrawlerConfig {
        max_pages: 2,
        ..CrawlerConfig::default()
    };
    let orchestrator = CrawlOrchestrator::new(engine.clone(), db.clone(), config);
    let feeds = [ChannelFeed::new(
        "audi",
        "https://www.avto.net/Ads/results.asp?znamka=Audi&model=A4",
    )];

    let first = orchestrator.run(&feeds).await;
    println!(
        "First crawl: {} events, errors: {}",
        first.event_count(),
        first.any_error
    );

    let known: HashSet<_> = db
        .load_all()
        .await
        .expect("load listings")
        .into_iter()
        .map(|listing| listing.external_id)
        .collect();

    let second = orchestrator.run(&feeds).await;
    for event in &second.batches["audi"] {
        if let ReconciliationEvent::NewListing { record } = event {
            assert!(
                !known.contains(&record.external_id),
                "listing {} was stored by the first crawl",
                record.external_id
            );
        }
    }

    drop(orchestrator);
    if let Ok(engine) = Arc::try_unwrap(engine) {
        engine.close().await.expect("close browser");
    }
}
