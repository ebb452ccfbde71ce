//! Page store

use libsql::{Value, params};

use crate::index::database::{
    INSERT_CHUNK, LOOKUP_CHUNK, int_column, placeholders, row_to_page, text_column,
};
use crate::index::{Database, DbError, NewPage, Page};

const PAGE_COLUMNS: &str = "id, site_id, path, code, content";

impl Database {
    /// Store a new page; fails if the site already has a page at that path
    pub async fn save_page(&self, page: &NewPage) -> Result<Page, DbError> {
        let mut saved = self.save_pages(std::slice::from_ref(page)).await?;
        saved
            .pop()
            .ok_or_else(|| DbError::Data(format!("No ID returned for page {}", page.path)))
    }

    /// Store new pages in multi-row statements, returning them with their IDs.
    ///
    /// Stored pages are never rewritten: a page is replaced by removing it
    /// through the index builder first.
    pub async fn save_pages(&self, pages: &[NewPage]) -> Result<Vec<Page>, DbError> {
        let mut saved = Vec::with_capacity(pages.len());

        for chunk in pages.chunks(INSERT_CHUNK) {
            let values = vec!["(?, ?, ?, ?)"; chunk.len()].join(", ");
            let sql = format!(
                "INSERT INTO pages (site_id, path, code, content) VALUES {}
                 RETURNING id, site_id, path",
                values
            );

            let mut params: Vec<Value> = Vec::with_capacity(chunk.len() * 4);
            for page in chunk {
                params.push(page.site_id.into());
                params.push(page.path.clone().into());
                params.push(i64::from(page.code).into());
                params.push(page.content.clone().into());
            }

            let ids = self
                .query_all(&sql, params, |row| {
                    Ok((
                        int_column(row, 0)?,
                        int_column(row, 1)?,
                        text_column(row, 2)?,
                    ))
                })
                .await?;

            // RETURNING order is unspecified, so match rows back by key
            for page in chunk {
                let id = ids
                    .iter()
                    .find(|(_, site_id, path)| *site_id == page.site_id && *path == page.path)
                    .map(|(id, _, _)| *id)
                    .ok_or_else(|| {
                        DbError::Data(format!("No ID returned for page {}", page.path))
                    })?;
                saved.push(Page {
                    id,
                    site_id: page.site_id,
                    path: page.path.clone(),
                    code: page.code,
                    content: page.content.clone(),
                });
            }
        }

        Ok(saved)
    }

    /// Get a page by site and path
    pub async fn find_page(&self, site_id: i64, path: &str) -> Result<Option<Page>, DbError> {
        self.query_one(
            &format!(
                "SELECT {} FROM pages WHERE site_id = ? AND path = ?",
                PAGE_COLUMNS
            ),
            params![site_id, path],
            row_to_page,
        )
        .await
    }

    /// Get the pages of a site stored at any of `paths`
    pub async fn find_pages_by_paths(
        &self,
        site_id: i64,
        paths: &[String],
    ) -> Result<Vec<Page>, DbError> {
        let mut pages = Vec::new();
        for chunk in paths.chunks(LOOKUP_CHUNK) {
            let sql = format!(
                "SELECT {} FROM pages WHERE site_id = ? AND path IN ({})",
                PAGE_COLUMNS,
                placeholders(chunk.len())
            );
            let mut params: Vec<Value> = Vec::with_capacity(chunk.len() + 1);
            params.push(site_id.into());
            params.extend(chunk.iter().map(|path| Value::from(path.clone())));
            pages.extend(self.query_all(&sql, params, row_to_page).await?);
        }
        Ok(pages)
    }

    /// Get pages by ID, in no particular order
    pub async fn find_pages_by_ids(&self, ids: &[i64]) -> Result<Vec<Page>, DbError> {
        let mut pages = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(LOOKUP_CHUNK) {
            let sql = format!(
                "SELECT {} FROM pages WHERE id IN ({})",
                PAGE_COLUMNS,
                placeholders(chunk.len())
            );
            let params: Vec<Value> = chunk.iter().map(|id| Value::from(*id)).collect();
            pages.extend(self.query_all(&sql, params, row_to_page).await?);
        }
        Ok(pages)
    }

    /// Delete a page row by site and path without touching its postings
    pub async fn delete_page(&self, site_id: i64, path: &str) -> Result<u64, DbError> {
        self.execute(
            "DELETE FROM pages WHERE site_id = ? AND path = ?",
            params![site_id, path],
        )
        .await
    }

    /// Delete a page row by ID without touching its postings
    pub async fn delete_page_by_id(&self, id: i64) -> Result<u64, DbError> {
        self.execute("DELETE FROM pages WHERE id = ?", params![id])
            .await
    }

    /// Number of pages of a site
    pub async fn count_pages(&self, site_id: i64) -> Result<i64, DbError> {
        self.query_count("SELECT COUNT(*) FROM pages WHERE site_id = ?", params![site_id])
            .await
    }

    /// Number of pages over all sites
    pub async fn count_all_pages(&self) -> Result<i64, DbError> {
        self.query_count("SELECT COUNT(*) FROM pages", params![])
            .await
    }
}
