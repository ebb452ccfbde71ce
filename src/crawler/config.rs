//! # Crawler Configuration Module
//!
//! Tuning knobs for crawl runs: request identity, politeness delay, pool size
//! and page batching. Every field has a default so the `crawler` section of
//! the configuration file may be partial or missing. A builder is provided for
//! programmatic use.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_referrer() -> String {
    "http://www.google.com".to_string()
}

fn default_politeness_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_parallelism_multiplier() -> usize {
    2
}

fn default_batch_size() -> usize {
    100
}

fn default_poll_interval_ms() -> u64 {
    50
}

/// Configuration for the crawler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Pool of user agents, one picked at random per request
    #[serde(default)]
    pub user_agents: Vec<String>,

    /// Referer header sent with every request
    #[serde(default = "default_referrer")]
    pub referrer: String,

    /// Delay before every request
    #[serde(default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,

    /// Timeout of a single request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Workers per available core, unless `pool_size` is set
    #[serde(default = "default_parallelism_multiplier")]
    pub parallelism_multiplier: usize,

    /// Fixed number of workers
    #[serde(default)]
    pub pool_size: Option<usize>,

    /// Pages buffered before they are stored and indexed
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Interval of the bucket supervisor
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agents: Vec::new(),
            referrer: default_referrer(),
            politeness_delay_ms: default_politeness_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            parallelism_multiplier: default_parallelism_multiplier(),
            pool_size: None,
            batch_size: default_batch_size(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the pool of user agents
    pub fn user_agents(mut self, user_agents: Vec<String>) -> Self {
        self.config.user_agents = user_agents;
        self
    }

    pub fn referrer(mut self, referrer: impl Into<String>) -> Self {
        self.config.referrer = referrer.into();
        self
    }

    /// Set the delay before every request in milliseconds
    pub fn politeness_delay_ms(mut self, politeness_delay_ms: u64) -> Self {
        self.config.politeness_delay_ms = politeness_delay_ms;
        self
    }

    pub fn request_timeout_secs(mut self, request_timeout_secs: u64) -> Self {
        self.config.request_timeout_secs = request_timeout_secs;
        self
    }

    pub fn parallelism_multiplier(mut self, parallelism_multiplier: usize) -> Self {
        self.config.parallelism_multiplier = parallelism_multiplier;
        self
    }

    /// Use a fixed number of workers
    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.config.pool_size = Some(pool_size);
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.config.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Number of concurrent crawl tasks of a run, at least 1
    pub fn worker_count(&self) -> usize {
        let workers = self.pool_size.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
                * self.parallelism_multiplier
        });
        workers.max(1)
    }

    /// Get the politeness delay as a Duration
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Batch size, at least 1
    pub fn batch_limit(&self) -> usize {
        self.batch_size.max(1)
    }
}
