//! Page capability for carwatch.
//!
//! Defines the element-query contract the crawler drives (`PageActions`,
//! `PageFactory`) and provides a headless Chromium implementation of it.

pub mod actions;
pub mod engine;
pub mod error;

pub use actions::{site_origin, PageActions, PageFactory};
pub use engine::{BrowserEngine, BrowserPage};
pub use error::{BrowserError, Result};
