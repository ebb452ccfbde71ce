//! Index module
//!
//! This module owns the persistent data model of the search engine (sites,
//! pages, lemmas and postings), the libsql-backed stores for them, and the
//! index builder that turns fetched pages into lemma frequencies and postings.

pub(crate) mod database;
pub mod error;
mod indexer;
mod lemmas;
mod pages;
mod postings;
mod schema;
mod sites;

pub use database::Database;
pub use error::DbError;
pub use indexer::{IndexBuilder, IndexSummary};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Crawl status of a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SiteStatus {
    Indexing,
    Indexed,
    Failed,
}

impl SiteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteStatus::Indexing => "INDEXING",
            SiteStatus::Indexed => "INDEXED",
            SiteStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SiteStatus {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INDEXING" => Ok(SiteStatus::Indexing),
            "INDEXED" => Ok(SiteStatus::Indexed),
            "FAILED" => Ok(SiteStatus::Failed),
            other => Err(DbError::Data(format!("Unknown site status: {}", other))),
        }
    }
}

/// A configured site in the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// ID of the site, 0 until stored
    pub id: i64,

    /// Root URL without a trailing slash
    pub url: String,

    /// Display name of the site
    pub name: String,

    /// Crawl status
    pub status: SiteStatus,

    /// Time of the last status transition
    pub status_time: DateTime<Utc>,

    /// Diagnostic of the last failure
    pub last_error: Option<String>,
}

impl Site {
    /// A new, unsaved site in INDEXING status
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: 0,
            url: url.into(),
            name: name.into(),
            status: SiteStatus::Indexing,
            status_time: Utc::now(),
            last_error: None,
        }
    }
}

/// A fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: i64,
    pub site_id: i64,
    /// Site-relative path, starting with `/`
    pub path: String,
    /// HTTP status code of the fetch
    pub code: u16,
    /// Raw response body
    pub content: String,
}

/// A page waiting to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewPage {
    pub site_id: i64,
    pub path: String,
    pub code: u16,
    pub content: String,
}

/// A normalized word of a site
#[derive(Debug, Clone, PartialEq)]
pub struct Lemma {
    pub id: i64,
    pub site_id: i64,
    pub word: String,
    /// Number of pages of the site containing the word
    pub frequency: i64,
}

/// One entry of the inverted index
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub id: i64,
    pub page_id: i64,
    pub lemma_id: i64,
    /// Occurrences of the lemma within the page
    pub rank: f64,
}
