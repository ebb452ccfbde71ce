//! Posting store

use libsql::{Value, params};

use crate::index::database::{INSERT_CHUNK, real_column, row_to_posting};
use crate::index::{Database, DbError, Posting};

impl Database {
    /// Store `(page_id, lemma_id, rank)` entries; an existing pair gets the new rank
    pub async fn save_postings(&self, postings: &[(i64, i64, f64)]) -> Result<u64, DbError> {
        let mut saved = 0;
        for chunk in postings.chunks(INSERT_CHUNK) {
            let sql = format!(
                "INSERT INTO postings (page_id, lemma_id, rank) VALUES {}
                 ON CONFLICT(page_id, lemma_id) DO UPDATE SET rank = excluded.rank",
                vec!["(?, ?, ?)"; chunk.len()].join(", ")
            );

            let mut params: Vec<Value> = Vec::with_capacity(chunk.len() * 3);
            for (page_id, lemma_id, rank) in chunk {
                params.push((*page_id).into());
                params.push((*lemma_id).into());
                params.push((*rank).into());
            }

            saved += self.execute(&sql, params).await?;
        }
        Ok(saved)
    }

    /// Get the postings of a page
    pub async fn find_postings_by_page(&self, page_id: i64) -> Result<Vec<Posting>, DbError> {
        self.query_all(
            "SELECT id, page_id, lemma_id, rank FROM postings WHERE page_id = ? ORDER BY id",
            params![page_id],
            row_to_posting,
        )
        .await
    }

    /// Get the postings of a lemma word, optionally restricted to one site.
    ///
    /// Results are in page discovery order.
    pub async fn find_postings_by_word(
        &self,
        word: &str,
        site_id: Option<i64>,
    ) -> Result<Vec<Posting>, DbError> {
        match site_id {
            Some(site_id) => {
                self.query_all(
                    "SELECT p.id, p.page_id, p.lemma_id, p.rank
                     FROM postings p JOIN lemmas l ON l.id = p.lemma_id
                     WHERE l.word = ? AND l.site_id = ?
                     ORDER BY p.page_id",
                    params![word, site_id],
                    row_to_posting,
                )
                .await
            }
            None => {
                self.query_all(
                    "SELECT p.id, p.page_id, p.lemma_id, p.rank
                     FROM postings p JOIN lemmas l ON l.id = p.lemma_id
                     WHERE l.word = ?
                     ORDER BY p.page_id",
                    params![word],
                    row_to_posting,
                )
                .await
            }
        }
    }

    /// Rank of a lemma word within a page, if the page contains it
    pub async fn get_rank(&self, page_id: i64, word: &str) -> Result<Option<f64>, DbError> {
        self.query_one(
            "SELECT p.rank FROM postings p JOIN lemmas l ON l.id = p.lemma_id
             WHERE p.page_id = ? AND l.word = ?",
            params![page_id, word],
            |row| real_column(row, 0),
        )
        .await
    }

    pub async fn delete_postings_by_page(&self, page_id: i64) -> Result<u64, DbError> {
        self.execute("DELETE FROM postings WHERE page_id = ?", params![page_id])
            .await
    }

    pub async fn delete_postings_by_site(&self, site_id: i64) -> Result<u64, DbError> {
        self.execute(
            "DELETE FROM postings WHERE page_id IN (SELECT id FROM pages WHERE site_id = ?)",
            params![site_id],
        )
        .await
    }
}
