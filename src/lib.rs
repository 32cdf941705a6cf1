//! Lead-Harvest: a paced lead crawler
//!
//! This crate walks the paginated result list of an authenticated search UI,
//! extracts one contact/company record per result row, and reports progress
//! to an external job tracker while adapting its request pacing to how the
//! target is responding.
//!
//! The page-rendering engine is injected through the [`browser::Browser`]
//! trait; the crate ships a script-less [`browser::HttpBrowser`] for static
//! markup and tests.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod session;
pub mod state;

use thiserror::Error;

/// Main error type for Lead-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid crawl request: {0}")]
    InvalidRequest(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// Errors raised by a browser implementation
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Element handle {0} is stale")]
    StaleElement(usize),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),

    #[error("No page is loaded")]
    NoPage,

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Browser session is closed")]
    Closed,
}

/// Result type alias for Lead-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for browser operations
pub type BrowserResult<T> = std::result::Result<T, BrowserError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlOutcome, CrawlRequest};
pub use extract::LeadRecord;
pub use output::{ProgressEvent, ProgressSink};
pub use state::{CrawlFailure, CrawlStatus};
