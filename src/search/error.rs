//! # Search Error Types Module
//!
//! Errors of the search engine. A blank query is a user error reported as
//! `EmptyQuery`; storage failures are wrapped from `DbError`.

use thiserror::Error;

use crate::error::Error as CrateError;
use crate::index::DbError;

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query is blank
    #[error("empty search query")]
    EmptyQuery,

    /// Error occurred during database operations
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Invalid search parameters
    #[error("Invalid search parameters: {0}")]
    InvalidParameters(String),
}

impl From<SearchError> for CrateError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Database(e) => e.into(),
            other => CrateError::Search(other.to_string()),
        }
    }
}
