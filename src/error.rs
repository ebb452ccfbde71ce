//! Error types for the sitesearch crate

use thiserror::Error;

/// Result type for sitesearch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sitesearch operations
#[derive(Debug, Error)]
pub enum Error {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// A crawl run is already in progress
    #[error("indexing is already running")]
    AlreadyRunning,

    /// No crawl run is in progress
    #[error("indexing is not running")]
    NotRunning,

    /// Network-level failure while fetching a page
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Page address is malformed or outside the configured sites
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Web crawling error
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Search error
    #[error("Search error: {0}")]
    Search(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
