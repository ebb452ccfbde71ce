//! Page batching
//!
//! Crawl tasks record pages here. A full batch is stored and indexed by the
//! task that filled it; the supervisor flushes the remainder when a site's
//! bucket drains. A closed batch rejects new pages.
//!
//! The buffer lock is only held to take pages out. Each site's share of a
//! batch is stored under that site's index lock, so sites index concurrently.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::future::try_join_all;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::index::{Database, DbError, IndexBuilder, NewPage, SiteStatus};

#[derive(Default)]
struct BatchState {
    pages: Vec<NewPage>,
    closed: bool,
}

pub struct PageBatch {
    db: Database,
    indexer: IndexBuilder,
    limit: usize,
    state: Mutex<BatchState>,
    // Held shared by every store in progress
    in_flight: RwLock<()>,
}

impl PageBatch {
    pub fn new(db: Database, indexer: IndexBuilder, limit: usize) -> Self {
        Self {
            db,
            indexer,
            limit: limit.max(1),
            state: Mutex::new(BatchState::default()),
            in_flight: RwLock::new(()),
        }
    }

    fn state(&self) -> MutexGuard<'_, BatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a page, storing the batch once it is full.
    ///
    /// Returns false when the batch is closed and the page was dropped.
    pub async fn add(&self, page: NewPage) -> Result<bool, DbError> {
        let full = {
            let mut state = self.state();
            if state.closed {
                return Ok(false);
            }
            state.pages.push(page);
            if state.pages.len() >= self.limit {
                std::mem::take(&mut state.pages)
            } else {
                Vec::new()
            }
        };

        if !full.is_empty() {
            let _storing = self.in_flight.read().await;
            self.store(full).await?;
        }
        Ok(true)
    }

    /// Store and index everything recorded so far, waiting for stores
    /// started by other tasks
    pub async fn flush(&self) -> Result<usize, DbError> {
        let pages = std::mem::take(&mut self.state().pages);
        self.store_and_settle(pages).await
    }

    /// Reject further pages and store what was recorded before
    pub async fn close(&self) -> Result<usize, DbError> {
        let pages = {
            let mut state = self.state();
            state.closed = true;
            std::mem::take(&mut state.pages)
        };
        self.store_and_settle(pages).await
    }

    pub fn pending(&self) -> usize {
        self.state().pages.len()
    }

    async fn store_and_settle(&self, pages: Vec<NewPage>) -> Result<usize, DbError> {
        let stored = {
            let _storing = self.in_flight.read().await;
            self.store(pages).await?
        };
        let _settled = self.in_flight.write().await;
        Ok(stored)
    }

    #[instrument(skip(self, pages), fields(pages = pages.len()))]
    async fn store(&self, pages: Vec<NewPage>) -> Result<usize, DbError> {
        if pages.is_empty() {
            return Ok(0);
        }
        let count = pages.len();

        let mut by_site: BTreeMap<i64, Vec<NewPage>> = BTreeMap::new();
        for page in pages {
            by_site.entry(page.site_id).or_default().push(page);
        }
        let sites = by_site.len();

        try_join_all(
            by_site
                .into_iter()
                .map(|(site_id, pages)| self.indexer.store_pages(site_id, pages)),
        )
        .await?;

        self.db.touch_sites_with_status(SiteStatus::Indexing).await?;
        debug!("Stored {} pages of {} sites", count, sites);
        Ok(count)
    }
}
