//! Error types for the crawler module

use crate::error::Error as CrateError;
use crate::index::DbError;
use thiserror::Error;

/// Error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Network-level failure; HTTP error statuses are not errors
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Page address is malformed or outside the configured sites
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Page address is not under any configured site
    #[error("page is outside the configured sites: {0}")]
    OutsideSites(String),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("indexing is already running")]
    AlreadyRunning,

    #[error("indexing is not running")]
    NotRunning,

    /// Storage failure while recording or indexing pages
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<CrawlError> for CrateError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::Fetch(e) => CrateError::Fetch(e),
            CrawlError::InvalidUrl(e) | CrawlError::OutsideSites(e) => CrateError::InvalidUrl(e),
            CrawlError::UrlParse(e) => CrateError::InvalidUrl(e.to_string()),
            CrawlError::AlreadyRunning => CrateError::AlreadyRunning,
            CrawlError::NotRunning => CrateError::NotRunning,
            CrawlError::Database(e) => e.into(),
            CrawlError::Other(e) => CrateError::Crawl(e),
        }
    }
}
