//! # sitesearch - Site Crawler and Lemma Search Engine
//!
//! This crate crawls a configured set of websites, builds a lemma-based
//! inverted index of their pages in a libsql database and answers ranked
//! full-text queries with highlighted snippets.
//!
//! ## Features
//!
//! - Concurrent crawling of every configured site on a bounded worker pool
//! - Stop and restart of crawl runs, with per-site status tracking
//! - Re-indexing of a single page while the rest of the index stays intact
//! - Russian and English normalization of words to lemmas, with stop words
//!   filtered out
//! - Search ranked by relative relevance, with snippets and paging
//! - A service facade returning structured responses, served over HTTP
//!
//! ## Example
//!
//! ```rust,no_run
//! use sitesearch::config::{AppConfig, SiteConfig};
//! use sitesearch::search::SearchOptions;
//! use sitesearch::service::SearchEngineService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig {
//!         sites: vec![SiteConfig {
//!             name: "Example".to_string(),
//!             url: "https://example.com".to_string(),
//!         }],
//!         ..Default::default()
//!     };
//!     let service = SearchEngineService::new(config).await?;
//!
//!     service.start_indexing().await?;
//!     service.scheduler().wait().await;
//!
//!     let response = service.search("quick fox", &SearchOptions::default()).await?;
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
mod error;
pub mod index;
pub mod morphology;
pub mod search;
pub mod server;
pub mod service;

pub use error::{Error, Result};

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::config::{AppConfig, SiteConfig};
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::search::{SearchOptions, SearchResponse};
    pub use crate::service::{ApiResponse, SearchEngineService};
}
