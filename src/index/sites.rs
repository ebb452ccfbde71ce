//! Site store

use chrono::Utc;
use libsql::params;
use tracing::{debug, instrument};

use crate::index::database::{int_column, row_to_site};
use crate::index::{Database, DbError, Site, SiteStatus};

const SITE_COLUMNS: &str = "id, url, name, status, status_time, last_error";

impl Database {
    /// Get a site by its root URL
    pub async fn find_site_by_url(&self, url: &str) -> Result<Option<Site>, DbError> {
        self.query_one(
            &format!("SELECT {} FROM sites WHERE url = ?", SITE_COLUMNS),
            params![url],
            row_to_site,
        )
        .await
    }

    /// Get a site by ID
    pub async fn find_site(&self, id: i64) -> Result<Option<Site>, DbError> {
        self.query_one(
            &format!("SELECT {} FROM sites WHERE id = ?", SITE_COLUMNS),
            params![id],
            row_to_site,
        )
        .await
    }

    /// Get all sites
    pub async fn list_sites(&self) -> Result<Vec<Site>, DbError> {
        self.query_all(
            &format!("SELECT {} FROM sites ORDER BY id", SITE_COLUMNS),
            params![],
            row_to_site,
        )
        .await
    }

    /// Get all sites in the given status
    pub async fn find_sites_by_status(&self, status: SiteStatus) -> Result<Vec<Site>, DbError> {
        self.query_all(
            &format!("SELECT {} FROM sites WHERE status = ? ORDER BY id", SITE_COLUMNS),
            params![status.as_str()],
            row_to_site,
        )
        .await
    }

    /// Insert a site when its ID is 0, update it by ID otherwise
    #[instrument(skip(self, site), fields(url = %site.url))]
    pub async fn save_site(&self, site: &Site) -> Result<Site, DbError> {
        if site.id == 0 {
            let id = self
                .query_one(
                    "INSERT INTO sites (url, name, status, status_time, last_error)
                     VALUES (?, ?, ?, ?, ?)
                     RETURNING id",
                    params![
                        site.url.clone(),
                        site.name.clone(),
                        site.status.as_str(),
                        site.status_time.timestamp(),
                        site.last_error.clone(),
                    ],
                    |row| int_column(row, 0),
                )
                .await?
                .ok_or_else(|| DbError::Data("No ID returned for inserted site".to_string()))?;

            debug!("Inserted site {} with id {}", site.url, id);
            return Ok(Site { id, ..site.clone() });
        }

        self.execute(
            "UPDATE sites SET url = ?, name = ?, status = ?, status_time = ?, last_error = ?
             WHERE id = ?",
            params![
                site.url.clone(),
                site.name.clone(),
                site.status.as_str(),
                site.status_time.timestamp(),
                site.last_error.clone(),
                site.id,
            ],
        )
        .await?;
        Ok(site.clone())
    }

    /// Move a site from `from` to `to`, stamping the status time.
    ///
    /// Returns false when the site is missing or no longer in `from`.
    pub async fn transition_site(
        &self,
        id: i64,
        from: SiteStatus,
        to: SiteStatus,
        last_error: Option<&str>,
    ) -> Result<bool, DbError> {
        let changed = self
            .execute(
                "UPDATE sites SET status = ?, status_time = ?, last_error = ?
                 WHERE id = ? AND status = ?",
                params![
                    to.as_str(),
                    Utc::now().timestamp(),
                    last_error.map(str::to_string),
                    id,
                    from.as_str(),
                ],
            )
            .await?;
        Ok(changed > 0)
    }

    /// Refresh the status time of every site in `status`
    pub async fn touch_sites_with_status(&self, status: SiteStatus) -> Result<u64, DbError> {
        self.execute(
            "UPDATE sites SET status_time = ? WHERE status = ?",
            params![Utc::now().timestamp(), status.as_str()],
        )
        .await
    }

    /// Delete a site together with its pages, lemmas and postings
    #[instrument(skip(self))]
    pub async fn delete_site(&self, id: i64) -> Result<(), DbError> {
        self.delete_postings_by_site(id).await?;
        self.execute("DELETE FROM lemmas WHERE site_id = ?", params![id])
            .await?;
        self.execute("DELETE FROM pages WHERE site_id = ?", params![id])
            .await?;
        self.execute("DELETE FROM sites WHERE id = ?", params![id])
            .await?;
        Ok(())
    }
}
