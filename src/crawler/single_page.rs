//! On-demand re-index of a single page

use tracing::{info, instrument};
use url::Url;

use crate::crawler::error::CrawlError;
use crate::crawler::scheduler::CrawlScheduler;
use crate::index::{NewPage, Page, Site, SiteStatus};

/// Path of a page address under `site_url`
fn split_page_url<'a>(url: &'a str, site_url: &str) -> &'a str {
    match &url[site_url.len()..] {
        "" => "/",
        path => path,
    }
}

impl CrawlScheduler {
    /// Fetch, store and index one page of a configured site, replacing its
    /// previous version. Allowed while a crawl is running; the replacement
    /// runs under the site's index lock.
    #[instrument(skip(self))]
    pub async fn index_page(&self, url: &str) -> Result<Page, CrawlError> {
        let decoded = urlencoding::decode(url.trim())
            .map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", url, e)))?;
        let decoded = decoded.trim();

        let parsed = Url::parse(decoded)?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(CrawlError::InvalidUrl(decoded.to_string()));
        }

        let site_config = self
            .config()
            .site_for_url(decoded)
            .ok_or_else(|| CrawlError::OutsideSites(decoded.to_string()))?;
        let path = split_page_url(decoded, &site_config.url).to_lowercase();

        let site = match self.db().find_site_by_url(&site_config.url).await? {
            Some(site) => site,
            None => {
                let mut site = Site::new(&site_config.name, &site_config.url);
                site.status = SiteStatus::Indexed;
                match self.db().save_site(&site).await {
                    Ok(site) => site,
                    // created by a concurrent call
                    Err(e) => self
                        .db()
                        .find_site_by_url(&site_config.url)
                        .await?
                        .ok_or(e)?,
                }
            }
        };

        let fetched = self
            .fetcher()
            .fetch(&format!("{}{}", site.url, path))
            .await?;
        let (mut saved, summary) = self
            .indexer()
            .store_pages(
                site.id,
                vec![NewPage {
                    site_id: site.id,
                    path,
                    code: fetched.code,
                    content: fetched.body,
                }],
            )
            .await?;
        let page = saved
            .pop()
            .ok_or_else(|| CrawlError::Other(format!("{} was not stored", url)))?;

        info!(
            "Indexed {}{} with {} lemmas",
            site.url, page.path, summary.postings
        );
        Ok(page)
    }
}
