//! Application configuration
//!
//! Loaded from a JSON file:
//!
//! ```json
//! {
//!   "sites": [{ "name": "Example", "url": "https://example.com/" }],
//!   "database": "searchengine.db",
//!   "crawler": { "user_agents": ["Mozilla/5.0"], "batch_size": 100 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::crawler::CrawlerConfig;
use crate::error::{Error, Result};

fn default_database() -> String {
    "searchengine.db".to_string()
}

/// A site to crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Sites in crawl order
    #[serde(default)]
    pub sites: Vec<SiteConfig>,

    /// Path of the index database
    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default)]
    pub crawler: CrawlerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sites: Vec::new(),
            database: default_database(),
            crawler: CrawlerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read and validate a configuration file
    pub async fn read_config(path: impl AsRef<Path>) -> Result<Self> {
        let config = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&config)?;
        config.normalized()
    }

    /// Validate site URLs and strip their trailing slashes
    pub fn normalized(mut self) -> Result<Self> {
        for site in &mut self.sites {
            site.url = normalize_site_url(&site.url)?;
        }
        Ok(self)
    }

    /// The configured site whose root prefixes `url`
    pub fn site_for_url(&self, url: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|site| {
            url.strip_prefix(site.url.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

/// Root URL of a site without the trailing slash
pub fn normalize_site_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed)
        .map_err(|e| Error::Config(format!("Invalid site URL '{}': {}", url, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(Error::Config(format!(
            "Site URL '{}' must be an http(s) address",
            url
        )));
    }

    Ok(trimmed.to_string())
}
