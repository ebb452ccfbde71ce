//! Search module
//!
//! Answers ranked full-text queries over the lemma index. Query lemmas are
//! resolved rarest first and intersected into a candidate set; candidates are
//! ranked by summed posting weight relative to the best match and returned
//! with highlighted snippets.

mod engine;
mod error;
mod snippet;

pub use engine::{SearchEngine, SearchOptions, SearchResponse, SearchResult};
pub use error::SearchError;
pub use snippet::build_snippet;
