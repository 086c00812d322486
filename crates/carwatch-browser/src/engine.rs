use crate::actions::{PageActions, PageFactory};
use crate::error::{BrowserError, Result};
use carwatch_core::BrowserConfig;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromiumConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Browser automation engine
pub struct BrowserEngine {
    browser: Browser,
    handler: JoinHandle<()>,
    user_agent: String,
    load_timeout: Duration,
}

impl BrowserEngine {
    /// Launch Chromium with the given settings
    pub async fn launch(config: &BrowserConfig, load_timeout: Duration) -> Result<Self> {
        let mut builder = ChromiumConfig::builder()
            .no_sandbox()
            .window_size(config.window_width, config.window_height);
        if !config.headless {
            builder = builder.with_head();
        }
        let chromium_config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(chromium_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // Spawn browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler event error: {}", e);
                }
            }
        });

        tracing::info!("Browser launched (headless: {})", config.headless);

        Ok(Self {
            browser,
            handler,
            user_agent: config.user_agent.clone(),
            load_timeout,
        })
    }

    /// Shut the browser down
    pub async fn close(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        let _ = self.browser.wait().await;
        self.handler.abort();
        tracing::info!("Browser closed");
        Ok(())
    }
}

#[async_trait::async_trait]
impl PageFactory for BrowserEngine {
    type Page = BrowserPage;

    async fn open_page(&self) -> Result<BrowserPage> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        page.set_user_agent(SetUserAgentOverrideParams::new(self.user_agent.clone()))
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        Ok(BrowserPage {
            page,
            load_timeout: self.load_timeout,
        })
    }
}

/// One Chromium tab
pub struct BrowserPage {
    page: Page,
    load_timeout: Duration,
}

#[async_trait::async_trait]
impl PageActions for BrowserPage {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<()> {
        tracing::debug!("Navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;
        Ok(())
    }

    async fn wait_until_loaded(&self) -> Result<()> {
        match tokio::time::timeout(self.load_timeout, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::NavigationError(e.to_string())),
            Err(_) => Err(BrowserError::Timeout(format!(
                "no load event within {:?}",
                self.load_timeout
            ))),
        }
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>> {
        self.page
            .find_elements(selector)
            .await
            .map_err(|e| BrowserError::ChromiumError(format!("{selector}: {e}")))
    }

    async fn find_all_in(&self, scope: &Element, selector: &str) -> Result<Vec<Element>> {
        scope
            .find_elements(selector)
            .await
            .map_err(|e| BrowserError::ChromiumError(format!("{selector}: {e}")))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::ChromiumError(format!("click {selector}: {e}")))?;
        Ok(())
    }

    async fn text_of(&self, element: &Element) -> Result<String> {
        let text = element
            .inner_text()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute_of(&self, element: &Element, name: &str) -> Result<Option<String>> {
        element
            .attribute(name)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }

    async fn current_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(url.unwrap_or_default())
    }

    async fn close(self) -> Result<()> {
        self.page
            .close()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }
}
