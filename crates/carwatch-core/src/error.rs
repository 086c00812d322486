//! Core error types for carwatch.
//!
//! This module defines the central error type used across all subsystems.
//! Each subsystem error is represented as a variant for clear error propagation.

use thiserror::Error;

/// Central error type for carwatch operations.
///
/// Each variant represents an error from a specific subsystem, allowing
/// for clear error propagation and handling across crate boundaries.
#[derive(Error, Debug)]
pub enum CarwatchError {
    /// Configuration errors (file loading, parsing, feed list)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors (invalid input, constraints)
    #[error("validation error: {0}")]
    Validation(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Config or feed file not found
    #[error("config file not found at {path}")]
    NotFound {
        /// Path where the file was expected
        path: String,
    },

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// I/O error reading config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },

    /// A line of the feed list could not be read as `channel feed_url`
    #[error("invalid feed list line {line}: {reason}")]
    InvalidFeedLine {
        /// 1-based line number
        line: usize,
        /// Reason for invalidity
        reason: String,
    },

    /// A feed URL is not an absolute http(s) URL
    #[error("invalid feed URL '{url}': {reason}")]
    InvalidFeedUrl {
        /// The offending URL
        url: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
