use carwatch_browser::{BrowserEngine, PageActions, PageFactory};
use carwatch_core::BrowserConfig;
use std::time::Duration;

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_browser_engine_launch() {
    let engine = BrowserEngine::launch(&BrowserConfig::default(), Duration::from_secs(30)).await;
    assert!(engine.is_ok(), "Failed to launch browser engine");
    engine.unwrap().close().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_navigation_and_query() {
    let engine = BrowserEngine::launch(&BrowserConfig::default(), Duration::from_secs(30))
        .await
        .unwrap();
    let page = engine.open_page().await.unwrap();

    page.navigate("https://example.com").await.unwrap();
    let heading = page.find("h1").await.unwrap().expect("h1 present");
    let text = page.text_of(&heading).await.unwrap();
    assert!(text.contains("Example"));

    assert!(page.find("#does-not-exist").await.unwrap().is_none());
    assert!(page.click("#does-not-exist").await.is_err());

    page.close().await.unwrap();
    engine.close().await.unwrap();
}
