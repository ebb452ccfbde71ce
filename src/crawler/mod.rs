//! Website crawler module
//!
//! This module crawls the configured sites into the index: a scheduler owning
//! the run lifecycle, recursive per-site crawl tasks on a bounded worker pool,
//! a polite HTTP fetcher, HTML extraction and page batching.

pub mod config;
pub mod content_extraction;
mod batch;
mod error;
mod fetcher;
mod links;
mod scheduler;
mod single_page;
mod site_crawler;

pub use batch::PageBatch;
pub use config::CrawlerConfig;
pub use content_extraction::{UNTITLED, extract_links, extract_text, extract_title};
pub use error::CrawlError;
pub use fetcher::{FetchedPage, PageFetcher};
pub use links::LinkNormalizer;
pub use scheduler::{CrawlScheduler, RunState};
pub use site_crawler::{HOME_PAGE_UNREACHABLE, STOPPED_BY_USER};
