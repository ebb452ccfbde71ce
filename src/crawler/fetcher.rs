//! HTTP page fetcher
//!
//! Waits the politeness delay before every request, sends a random user agent
//! from the configured pool with a fixed referrer, and returns the body for any
//! HTTP status.

use rand::seq::SliceRandom;
use reqwest::Client as ReqwestClient;
use reqwest::header::{REFERER, USER_AGENT};
use tracing::{debug, instrument};

use crate::crawler::config::CrawlerConfig;
use crate::crawler::error::CrawlError;

/// Status code and body of a fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub code: u16,
    pub body: String,
}

#[derive(Clone)]
pub struct PageFetcher {
    client: ReqwestClient,
    config: CrawlerConfig,
    fallback_agent: String,
}

impl PageFetcher {
    pub fn new(config: CrawlerConfig) -> Result<Self, CrawlError> {
        let client = ReqwestClient::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CrawlError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            fallback_agent: format!("sitesearch/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    fn pick_user_agent(&self) -> &str {
        self.config
            .user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(&self.fallback_agent)
    }

    /// Fetch `url`; only network-level failures are errors
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, CrawlError> {
        tokio::time::sleep(self.config.politeness_delay()).await;

        let user_agent = self.pick_user_agent().to_string();
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .header(REFERER, &self.config.referrer)
            .send()
            .await
            .map_err(|e| CrawlError::Fetch(format!("{}: {}", url, e)))?;

        let code = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| CrawlError::Fetch(format!("{}: {}", url, e)))?;

        debug!("Fetched {} with status {}", url, code);
        Ok(FetchedPage { code, body })
    }
}
