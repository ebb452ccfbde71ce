//! Index statistics

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::index::{Database, DbError, SiteStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalStatistics {
    /// Configured sites
    pub sites: usize,
    pub pages: i64,
    pub lemmas: i64,
    /// Whether a crawl run is in progress
    pub indexing: bool,
}

/// Statistics of one configured site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteStatistics {
    pub url: String,
    pub name: String,
    /// `None` for sites never crawled
    pub status: Option<SiteStatus>,
    /// Unix seconds of the last status change
    #[serde(rename = "statusTime")]
    pub status_time: Option<i64>,
    pub error: Option<String>,
    pub pages: i64,
    pub lemmas: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total: TotalStatistics,
    pub detailed: Vec<SiteStatistics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsResponse {
    pub statistics: Statistics,
}

/// Collect totals and per-site details for the configured sites
pub async fn collect_statistics(
    config: &AppConfig,
    db: &Database,
    indexing: bool,
) -> Result<Statistics, DbError> {
    let mut detailed = Vec::with_capacity(config.sites.len());
    for site_config in &config.sites {
        let item = match db.find_site_by_url(&site_config.url).await? {
            Some(site) => SiteStatistics {
                url: site.url,
                name: site.name,
                status: Some(site.status),
                status_time: Some(site.status_time.timestamp()),
                error: site.last_error,
                pages: db.count_pages(site.id).await?,
                lemmas: db.count_lemmas(site.id).await?,
            },
            None => SiteStatistics {
                url: site_config.url.clone(),
                name: site_config.name.clone(),
                status: None,
                status_time: None,
                error: None,
                pages: 0,
                lemmas: 0,
            },
        };
        detailed.push(item);
    }

    Ok(Statistics {
        total: TotalStatistics {
            sites: config.sites.len(),
            pages: db.count_all_pages().await?,
            lemmas: db.count_all_lemmas().await?,
            indexing,
        },
        detailed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::SiteConfig;
    use crate::index::database::tests::setup_test_db;
    use crate::index::{NewPage, Site};

    #[tokio::test]
    async fn test_collect_statistics() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let config = AppConfig {
            sites: vec![
                SiteConfig {
                    name: "Crawled".to_string(),
                    url: "https://crawled.com".to_string(),
                },
                SiteConfig {
                    name: "Fresh".to_string(),
                    url: "https://fresh.com".to_string(),
                },
            ],
            ..Default::default()
        };

        let site = db
            .save_site(&Site::new("Crawled", "https://crawled.com"))
            .await
            .unwrap();
        db.save_page(&NewPage {
            site_id: site.id,
            path: "/".to_string(),
            code: 200,
            content: String::new(),
        })
        .await
        .unwrap();
        db.insert_lemmas(site.id, &[("fox".to_string(), 1), ("dog".to_string(), 1)])
            .await
            .unwrap();

        let statistics = collect_statistics(&config, &db, true).await.unwrap();

        assert_eq!(statistics.total.sites, 2);
        assert_eq!(statistics.total.pages, 1);
        assert_eq!(statistics.total.lemmas, 2);
        assert!(statistics.total.indexing);

        let crawled = &statistics.detailed[0];
        assert_eq!(crawled.status, Some(SiteStatus::Indexing));
        assert_eq!(crawled.pages, 1);
        assert_eq!(crawled.lemmas, 2);

        let fresh = &statistics.detailed[1];
        assert_eq!(fresh.name, "Fresh");
        assert!(fresh.status.is_none());
        assert_eq!(fresh.pages, 0);
    }
}
