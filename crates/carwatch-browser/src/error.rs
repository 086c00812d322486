use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

/// Failures of the browser or of an action on an open page.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Chromium could not be started
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// A DevTools call on an open page failed
    #[error("browser error: {0}")]
    ChromiumError(String),

    #[error("navigation failed: {0}")]
    NavigationError(String),

    /// Nothing on the page matches the selector
    #[error("no element matches {0}")]
    SelectorNotFound(String),

    #[error("page did not load: {0}")]
    Timeout(String),
}
