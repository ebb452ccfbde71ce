//! Error types for the morphology module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for morphology lookups
#[derive(Debug, Error)]
pub enum MorphologyError {
    /// Token is not a word of a supported alphabet (mixed scripts, digits, punctuation)
    #[error("'{0}' is not a correct english or russian word")]
    Unrecognized(String),
}

impl From<MorphologyError> for CrateError {
    fn from(err: MorphologyError) -> Self {
        CrateError::Other(err.to_string())
    }
}
