//! # Service Facade
//!
//! `SearchEngineService` wires configuration, storage, crawling and search
//! together and exposes the user-facing operations: start and stop a crawl,
//! re-index one page, search and report statistics. User mistakes come back
//! as `ApiResponse` values with `result: false`; only storage failures are
//! returned as errors.

mod response;
mod statistics;

pub use response::{ApiResponse, Empty};
pub use statistics::{
    SiteStatistics, Statistics, StatisticsResponse, TotalStatistics, collect_statistics,
};

use tracing::{error, instrument, warn};

use crate::config::AppConfig;
use crate::crawler::{CrawlError, CrawlScheduler};
use crate::error::Result;
use crate::index::{Database, IndexBuilder};
use crate::morphology::LemmaRanker;
use crate::search::{SearchEngine, SearchError, SearchOptions, SearchResponse};

pub const ALREADY_RUNNING: &str = "indexing is already running";
pub const NOT_RUNNING: &str = "indexing is not running";
pub const EMPTY_QUERY: &str = "empty search query";
pub const OUTSIDE_SITES: &str = "page is outside the configured sites";
pub const INVALID_ADDRESS: &str = "invalid page address";

pub struct SearchEngineService {
    config: AppConfig,
    db: Database,
    scheduler: CrawlScheduler,
    engine: SearchEngine,
}

impl SearchEngineService {
    /// Open the configured database and build the service
    pub async fn new(config: AppConfig) -> Result<Self> {
        let db = Database::new_from_path(&config.database).await?;
        Self::with_database(config, db)
    }

    pub fn with_database(config: AppConfig, db: Database) -> Result<Self> {
        let ranker = LemmaRanker::default();
        let indexer = IndexBuilder::new(db.clone(), ranker.clone());
        let scheduler = CrawlScheduler::new(config.clone(), db.clone(), indexer)?;
        let engine = SearchEngine::new(db.clone(), ranker);

        Ok(Self {
            config,
            db,
            scheduler,
            engine,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &CrawlScheduler {
        &self.scheduler
    }

    #[instrument(skip(self))]
    pub async fn start_indexing(&self) -> Result<ApiResponse<Empty>> {
        match self.scheduler.start().await {
            Ok(()) => Ok(ApiResponse::success()),
            Err(CrawlError::AlreadyRunning) => Ok(ApiResponse::error(ALREADY_RUNNING)),
            Err(CrawlError::InvalidUrl(e)) => {
                warn!("Cannot crawl configured site: {}", e);
                Ok(ApiResponse::error(e))
            }
            Err(e) => {
                error!("Failed to start indexing: {}", e);
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn stop_indexing(&self) -> Result<ApiResponse<Empty>> {
        match self.scheduler.stop().await {
            Ok(()) => Ok(ApiResponse::success()),
            Err(CrawlError::NotRunning) => Ok(ApiResponse::error(NOT_RUNNING)),
            Err(e) => {
                error!("Failed to stop indexing: {}", e);
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn index_page(&self, url: &str) -> Result<ApiResponse<Empty>> {
        match self.scheduler.index_page(url).await {
            Ok(_) => Ok(ApiResponse::success()),
            Err(CrawlError::OutsideSites(_)) => Ok(ApiResponse::error(OUTSIDE_SITES)),
            Err(CrawlError::InvalidUrl(_) | CrawlError::UrlParse(_)) => {
                Ok(ApiResponse::error(INVALID_ADDRESS))
            }
            Err(CrawlError::Fetch(e)) => {
                warn!("Page fetch failed: {}", e);
                Ok(ApiResponse::error(format!("page is unreachable: {}", e)))
            }
            Err(e) => {
                error!("Failed to index page {}: {}", url, e);
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<ApiResponse<SearchResponse>> {
        match self.engine.search(query, options).await {
            Ok(response) => Ok(ApiResponse::ok(response)),
            Err(SearchError::EmptyQuery) => Ok(ApiResponse::error(EMPTY_QUERY)),
            Err(SearchError::InvalidParameters(e)) => Ok(ApiResponse::error(e)),
            Err(e) => {
                error!("Search failed: {}", e);
                Err(e.into())
            }
        }
    }

    pub async fn statistics(&self) -> Result<ApiResponse<StatisticsResponse>> {
        let statistics =
            collect_statistics(&self.config, &self.db, self.scheduler.is_running()).await?;
        Ok(ApiResponse::ok(StatisticsResponse { statistics }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::SiteConfig;
    use crate::crawler::{CrawlerConfig, RunState};
    use crate::index::database::tests::setup_test_db;

    fn service(db: &Database, sites: Vec<SiteConfig>) -> SearchEngineService {
        let config = AppConfig {
            sites,
            crawler: CrawlerConfig::builder()
                .politeness_delay_ms(0)
                .poll_interval_ms(10)
                .build(),
            ..Default::default()
        };
        SearchEngineService::with_database(config, db.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_crawl_then_search() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_body(
                r#"<html><head><title>Home</title></head>
                <body>The quick brown fox <a href="/lazy">more</a></body></html>"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/lazy")
            .with_body("<body>jumps over the lazy dog</body>")
            .create_async()
            .await;

        let service = service(
            &db,
            vec![SiteConfig {
                name: "Mock".to_string(),
                url: server.url(),
            }],
        );

        assert!(service.start_indexing().await.unwrap().result);
        let again = service.start_indexing().await.unwrap();
        assert!(!again.result);
        assert_eq!(again.error.as_deref(), Some(ALREADY_RUNNING));
        assert_eq!(service.scheduler().wait().await, RunState::Completed);

        let stopped = service.stop_indexing().await.unwrap();
        assert_eq!(stopped.error.as_deref(), Some(NOT_RUNNING));

        let found = service
            .search("foxes", &SearchOptions::default())
            .await
            .unwrap();
        assert!(found.result);
        let found = found.payload.unwrap();
        assert_eq!(found.count, 1);
        assert_eq!(found.data[0].uri, "/");
        assert_eq!(found.data[0].title, "Home");

        let statistics = service.statistics().await.unwrap().payload.unwrap();
        assert_eq!(statistics.statistics.total.pages, 2);
        assert!(!statistics.statistics.total.indexing);
    }

    #[tokio::test]
    async fn test_user_errors_are_responses() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let service = service(
            &db,
            vec![SiteConfig {
                name: "Example".to_string(),
                url: "https://example.com".to_string(),
            }],
        );

        let empty = service.search("", &SearchOptions::default()).await.unwrap();
        assert!(!empty.result);
        assert_eq!(empty.error.as_deref(), Some(EMPTY_QUERY));

        let absent = service
            .search("unicorn", &SearchOptions::default())
            .await
            .unwrap();
        assert!(absent.result);
        assert_eq!(absent.payload.unwrap().count, 0);

        let outside = service.index_page("https://other.com/").await.unwrap();
        assert_eq!(outside.error.as_deref(), Some(OUTSIDE_SITES));

        let invalid = service.index_page("no address").await.unwrap();
        assert_eq!(invalid.error.as_deref(), Some(INVALID_ADDRESS));
    }
}
