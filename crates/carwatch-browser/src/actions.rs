use crate::error::{BrowserError, Result};

/// Element queries and interactions on one open page.
///
/// Selectors are CSS and opaque to the crawler; they come from configuration.
/// Scoped queries (`*_in`) only match descendants of the given element.
#[async_trait::async_trait]
pub trait PageActions: Send + Sync {
    /// Handle to an element of the current document
    type Element: Send + Sync;

    /// Navigate to a URL
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Wait for the pending navigation to finish loading
    async fn wait_until_loaded(&self) -> Result<()>;

    /// All elements matching a selector, in document order
    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>>;

    /// First element matching a selector
    async fn find(&self, selector: &str) -> Result<Option<Self::Element>> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    /// Descendants of `scope` matching a selector
    async fn find_all_in(&self, scope: &Self::Element, selector: &str)
        -> Result<Vec<Self::Element>>;

    /// First descendant of `scope` matching a selector
    async fn find_in(&self, scope: &Self::Element, selector: &str) -> Result<Option<Self::Element>> {
        Ok(self.find_all_in(scope, selector).await?.into_iter().next())
    }

    /// Click the first element matching a selector
    async fn click(&self, selector: &str) -> Result<()>;

    /// Rendered text of an element
    async fn text_of(&self, element: &Self::Element) -> Result<String>;

    /// Attribute value of an element
    async fn attribute_of(&self, element: &Self::Element, name: &str) -> Result<Option<String>>;

    /// URL of the current document
    async fn current_url(&self) -> Result<String>;

    /// Release the page
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Opens fresh pages, one per crawled feed.
#[async_trait::async_trait]
pub trait PageFactory: Send + Sync {
    /// Page type handed out by this factory
    type Page: PageActions;

    /// Open a new blank page
    async fn open_page(&self) -> Result<Self::Page>;
}

/// Helper to extract the site origin (`scheme://host[:port]/`) from a URL
pub fn site_origin(url: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(url)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {}", e)))?;

    if parsed.host_str().is_none() {
        return Err(BrowserError::NavigationError("No host in URL".to_string()));
    }

    url::Url::parse(&parsed.origin().ascii_serialization())
        .map_err(|e| BrowserError::NavigationError(format!("Invalid origin: {}", e)))
}
