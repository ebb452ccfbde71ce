//! Crawl scheduler
//!
//! Owns the lifecycle of crawl runs. A run resets every configured site,
//! submits one root task per site and spawns a supervisor that finalizes each
//! site once its bucket of tasks drains. Start and stop are serialized by a
//! control lock; the run state is published on a watch channel.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::config::AppConfig;
use crate::crawler::batch::PageBatch;
use crate::crawler::error::CrawlError;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::links::LinkNormalizer;
use crate::crawler::site_crawler::{RunContext, STOPPED_BY_USER, SiteCrawl, submit};
use crate::index::{Database, DbError, IndexBuilder, Site, SiteStatus};

/// State of the current or last crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Stopped,
    Failed,
}

struct CrawlRun {
    context: Arc<RunContext>,
    sites: Vec<Arc<SiteCrawl>>,
}

pub struct CrawlScheduler {
    config: AppConfig,
    db: Database,
    indexer: IndexBuilder,
    fetcher: PageFetcher,
    control: tokio::sync::Mutex<()>,
    current: Mutex<Option<Arc<CrawlRun>>>,
    state: Arc<watch::Sender<RunState>>,
}

impl CrawlScheduler {
    pub fn new(config: AppConfig, db: Database, indexer: IndexBuilder) -> Result<Self, CrawlError> {
        let fetcher = PageFetcher::new(config.crawler.clone())?;
        let (state, _) = watch::channel(RunState::Idle);

        Ok(Self {
            config,
            db,
            indexer,
            fetcher,
            control: tokio::sync::Mutex::new(()),
            current: Mutex::new(None),
            state: Arc::new(state),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub(crate) fn db(&self) -> &Database {
        &self.db
    }

    pub(crate) fn indexer(&self) -> &IndexBuilder {
        &self.indexer
    }

    pub(crate) fn fetcher(&self) -> &PageFetcher {
        &self.fetcher
    }

    pub fn is_running(&self) -> bool {
        *self.state.borrow() == RunState::Running
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Receiver of run state changes
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Wait until no run is in progress and return the final state
    pub async fn wait(&self) -> RunState {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|state| *state != RunState::Running).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        }
    }

    /// Start a crawl of every configured site
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<(), CrawlError> {
        let _control = self.control.lock().await;
        if self.is_running() {
            return Err(CrawlError::AlreadyRunning);
        }

        let workers = self.config.crawler.worker_count();
        let batch = Arc::new(PageBatch::new(
            self.db.clone(),
            self.indexer.clone(),
            self.config.crawler.batch_limit(),
        ));
        let context = Arc::new(RunContext::new(
            self.db.clone(),
            self.fetcher.clone(),
            batch,
            workers,
        ));

        let mut sites = Vec::with_capacity(self.config.sites.len());
        for site_config in &self.config.sites {
            let links = LinkNormalizer::new(&site_config.url)
                .map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", site_config.url, e)))?;

            if let Some(existing) = self.db.find_site_by_url(&site_config.url).await? {
                self.db.delete_site(existing.id).await?;
            }
            let site = self
                .db
                .save_site(&Site::new(&site_config.name, &site_config.url))
                .await?;
            sites.push(Arc::new(SiteCrawl::new(site, links)));
        }

        let run = Arc::new(CrawlRun { context, sites });
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(run.clone());
        self.state.send_replace(RunState::Running);
        info!(
            "Crawl started for {} sites with {} workers",
            run.sites.len(),
            workers
        );

        for site in &run.sites {
            site.visit("/");
            submit(&run.context, site, "/".to_string());
        }

        tokio::spawn(supervise(
            run,
            self.state.clone(),
            self.config.crawler.poll_interval(),
        ));
        Ok(())
    }

    /// Stop the current run; sites still crawling end as FAILED
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<(), CrawlError> {
        let _control = self.control.lock().await;
        if !self.is_running() {
            return Err(CrawlError::NotRunning);
        }
        let Some(run) = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        else {
            return Err(CrawlError::NotRunning);
        };

        run.context.stop();
        let result = stop_run(&run).await;
        self.state.send_replace(match result {
            Ok(()) => RunState::Stopped,
            Err(_) => RunState::Failed,
        });
        info!("Crawl stopped");
        result.map_err(CrawlError::from)
    }
}

async fn stop_run(run: &CrawlRun) -> Result<(), DbError> {
    let stored = run.context.batch.close().await?;
    if stored > 0 {
        info!("Stored {} pages recorded before stop", stored);
    }

    for site in &run.sites {
        site.finalize();
    }
    for site in run.context.db.find_sites_by_status(SiteStatus::Indexing).await? {
        run.context
            .db
            .transition_site(
                site.id,
                SiteStatus::Indexing,
                SiteStatus::Failed,
                Some(STOPPED_BY_USER),
            )
            .await?;
    }
    Ok(())
}

/// Final status of a drained site
async fn finish_site(run: &CrawlRun, site: &SiteCrawl) -> Result<(), DbError> {
    run.context.batch.flush().await?;

    let (status, last_error) = if run.context.is_stopped() {
        (SiteStatus::Failed, Some(STOPPED_BY_USER))
    } else {
        (SiteStatus::Indexed, None)
    };
    if run
        .context
        .db
        .transition_site(site.site.id, SiteStatus::Indexing, status, last_error)
        .await?
    {
        info!(
            "Site {} finished as {} after {} pages",
            site.site.url,
            status,
            site.visited_count()
        );
    } else {
        warn!("Site {} finished without indexing its home page", site.site.url);
    }
    Ok(())
}

async fn supervise(
    run: Arc<CrawlRun>,
    state: Arc<watch::Sender<RunState>>,
    poll_interval: std::time::Duration,
) {
    let mut interval = tokio::time::interval(poll_interval);
    let mut failed = false;

    loop {
        interval.tick().await;
        if run.context.is_stopped() {
            return;
        }

        let mut pending = 0;
        for site in &run.sites {
            if site.is_finalized() {
                continue;
            }
            if !site.drain_finished() {
                pending += 1;
                continue;
            }
            if site.finalize() {
                if let Err(e) = finish_site(&run, site).await {
                    error!("Failed to finalize {}: {}", site.site.url, e);
                    failed = true;
                }
            }
        }

        if pending == 0 {
            break;
        }
    }

    let outcome = if failed {
        RunState::Failed
    } else {
        RunState::Completed
    };
    let changed = state.send_if_modified(|current| {
        if *current == RunState::Running {
            *current = outcome;
            true
        } else {
            false
        }
    });
    if changed {
        info!("Crawl finished: {:?}", outcome);
    }
}
