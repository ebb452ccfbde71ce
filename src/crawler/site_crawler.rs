//! Recursive crawl of one site
//!
//! A crawl task fetches one page, records it and submits a child task for
//! every newly discovered path of the same site. Children are not awaited;
//! the scheduler's supervisor detects when a site's bucket has drained.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashSet;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::crawler::batch::PageBatch;
use crate::crawler::content_extraction::extract_links;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::links::LinkNormalizer;
use crate::index::{Database, NewPage, Site, SiteStatus};

/// Diagnostic stored on a site whose root page could not be fetched
pub const HOME_PAGE_UNREACHABLE: &str = "home page unreachable";

/// Diagnostic stored on sites cut short by a stop request
pub const STOPPED_BY_USER: &str = "stopped by user";

/// Resources shared by every task of one run
pub(crate) struct RunContext {
    pub(crate) db: Database,
    pub(crate) fetcher: PageFetcher,
    pub(crate) batch: Arc<PageBatch>,
    pub(crate) permits: Arc<Semaphore>,
    stopped: AtomicBool,
}

impl RunContext {
    pub(crate) fn new(
        db: Database,
        fetcher: PageFetcher,
        batch: Arc<PageBatch>,
        workers: usize,
    ) -> Self {
        Self {
            db,
            fetcher,
            batch,
            permits: Arc::new(Semaphore::new(workers)),
            stopped: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Raise the stop flag and release every task waiting for a worker
    pub(crate) fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.permits.close();
    }
}

/// Crawl state of one site within a run
pub(crate) struct SiteCrawl {
    pub(crate) site: Site,
    links: LinkNormalizer,
    visited: DashSet<String>,
    bucket: Mutex<Vec<JoinHandle<()>>>,
    finalized: AtomicBool,
}

impl SiteCrawl {
    pub(crate) fn new(site: Site, links: LinkNormalizer) -> Self {
        Self {
            site,
            links,
            visited: DashSet::new(),
            bucket: Mutex::new(Vec::new()),
            finalized: AtomicBool::new(false),
        }
    }

    fn bucket(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.bucket.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop finished tasks; true once none is left
    pub(crate) fn drain_finished(&self) -> bool {
        let mut bucket = self.bucket();
        bucket.retain(|handle| !handle.is_finished());
        bucket.is_empty()
    }

    /// Mark the site final; true only for the first caller
    pub(crate) fn finalize(&self) -> bool {
        !self.finalized.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::SeqCst)
    }

    /// Record `path` as visited; false if it already was
    pub(crate) fn visit(&self, path: &str) -> bool {
        self.visited.insert(path.to_string())
    }

    pub(crate) fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

/// Spawn a crawl task for `path` into the site's bucket.
///
/// The handle is pushed under the bucket lock before the spawning task can
/// finish, so an empty bucket means no task of the site is alive.
pub(crate) fn submit(run: &Arc<RunContext>, site: &Arc<SiteCrawl>, path: String) {
    let mut bucket = site.bucket();
    if run.is_stopped() {
        return;
    }
    let handle = tokio::spawn(crawl_page(run.clone(), site.clone(), path));
    bucket.push(handle);
}

fn crawl_page(run: Arc<RunContext>, site: Arc<SiteCrawl>, path: String) -> BoxFuture<'static, ()> {
    async move {
        let Ok(_permit) = run.permits.clone().acquire_owned().await else {
            return;
        };
        if run.is_stopped() {
            return;
        }

        let url = format!("{}{}", site.site.url, path);
        let fetched = match run.fetcher.fetch(&url).await {
            Ok(fetched) => fetched,
            Err(e) if path == "/" => {
                warn!("Home page of {} unreachable: {}", site.site.url, e);
                if let Err(e) = run
                    .db
                    .transition_site(
                        site.site.id,
                        SiteStatus::Indexing,
                        SiteStatus::Failed,
                        Some(HOME_PAGE_UNREACHABLE),
                    )
                    .await
                {
                    error!("Failed to mark {} as failed: {}", site.site.url, e);
                }
                return;
            }
            Err(e) => {
                debug!("Skipping {}: {}", url, e);
                return;
            }
        };

        if run.is_stopped() {
            debug!("Discarding {} fetched after stop", url);
            return;
        }

        let links = extract_links(&fetched.body);
        let page = NewPage {
            site_id: site.site.id,
            path: path.clone(),
            code: fetched.code,
            content: fetched.body,
        };
        match run.batch.add(page).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("Discarding {} recorded after stop", url);
                return;
            }
            Err(e) => {
                error!("Failed to store {}: {}", url, e);
                return;
            }
        }

        let mut discovered = 0;
        for href in links {
            if let Some(child) = site.links.normalize(&href) {
                if site.visit(&child) {
                    submit(&run, &site, child);
                    discovered += 1;
                }
            }
        }

        if path == "/" {
            info!("Crawling {}: home page recorded", site.site.url);
        }
        debug!("Crawled {} ({}), {} new links", url, fetched.code, discovered);
    }
    .boxed()
}
