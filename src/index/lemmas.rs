//! Lemma store

use libsql::{Value, params};

use crate::index::database::{INSERT_CHUNK, LOOKUP_CHUNK, placeholders, row_to_lemma};
use crate::index::{Database, DbError, Lemma};

const LEMMA_COLUMNS: &str = "id, site_id, word, frequency";

impl Database {
    /// Get the lemmas of a site matching any of `words`
    pub async fn find_lemmas_by_words(
        &self,
        site_id: i64,
        words: &[String],
    ) -> Result<Vec<Lemma>, DbError> {
        let mut lemmas = Vec::with_capacity(words.len());
        for chunk in words.chunks(LOOKUP_CHUNK) {
            let sql = format!(
                "SELECT {} FROM lemmas WHERE site_id = ? AND word IN ({})",
                LEMMA_COLUMNS,
                placeholders(chunk.len())
            );
            let mut params: Vec<Value> = Vec::with_capacity(chunk.len() + 1);
            params.push(site_id.into());
            params.extend(chunk.iter().map(|word| Value::from(word.clone())));

            lemmas.extend(self.query_all(&sql, params, row_to_lemma).await?);
        }
        Ok(lemmas)
    }

    /// Get lemmas by ID
    pub async fn find_lemmas_by_ids(&self, ids: &[i64]) -> Result<Vec<Lemma>, DbError> {
        let mut lemmas = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(LOOKUP_CHUNK) {
            let sql = format!(
                "SELECT {} FROM lemmas WHERE id IN ({})",
                LEMMA_COLUMNS,
                placeholders(chunk.len())
            );
            let params: Vec<Value> = chunk.iter().map(|id| Value::from(*id)).collect();
            lemmas.extend(self.query_all(&sql, params, row_to_lemma).await?);
        }
        Ok(lemmas)
    }

    /// Get the lemma rows for `word` on every site
    pub async fn find_lemmas_by_word(&self, word: &str) -> Result<Vec<Lemma>, DbError> {
        self.query_all(
            &format!(
                "SELECT {} FROM lemmas WHERE word = ? ORDER BY site_id",
                LEMMA_COLUMNS
            ),
            params![word],
            row_to_lemma,
        )
        .await
    }

    /// Insert `(word, frequency)` rows for a site.
    ///
    /// A word that already exists on the site has `frequency` added to it.
    pub async fn insert_lemmas(
        &self,
        site_id: i64,
        lemmas: &[(String, i64)],
    ) -> Result<u64, DbError> {
        let mut inserted = 0;
        for chunk in lemmas.chunks(INSERT_CHUNK) {
            let sql = format!(
                "INSERT INTO lemmas (site_id, word, frequency) VALUES {}
                 ON CONFLICT(site_id, word) DO UPDATE SET
                 frequency = frequency + excluded.frequency",
                vec!["(?, ?, ?)"; chunk.len()].join(", ")
            );

            let mut params: Vec<Value> = Vec::with_capacity(chunk.len() * 3);
            for (word, frequency) in chunk {
                params.push(site_id.into());
                params.push(word.clone().into());
                params.push((*frequency).into());
            }

            inserted += self.execute(&sql, params).await?;
        }
        Ok(inserted)
    }

    /// Write the `frequency` of each lemma by ID
    pub async fn update_lemma_frequencies(&self, lemmas: &[Lemma]) -> Result<u64, DbError> {
        let mut updated = 0;
        for chunk in lemmas.chunks(INSERT_CHUNK) {
            let sql = format!(
                "UPDATE lemmas SET frequency = CASE id {} END WHERE id IN ({})",
                vec!["WHEN ? THEN ?"; chunk.len()].join(" "),
                placeholders(chunk.len())
            );

            let mut params: Vec<Value> = Vec::with_capacity(chunk.len() * 3);
            for lemma in chunk {
                params.push(lemma.id.into());
                params.push(lemma.frequency.into());
            }
            params.extend(chunk.iter().map(|lemma| Value::from(lemma.id)));

            updated += self.execute(&sql, params).await?;
        }
        Ok(updated)
    }

    /// Delete lemmas by ID
    pub async fn delete_lemmas(&self, ids: &[i64]) -> Result<u64, DbError> {
        let mut deleted = 0;
        for chunk in ids.chunks(LOOKUP_CHUNK) {
            let sql = format!(
                "DELETE FROM lemmas WHERE id IN ({})",
                placeholders(chunk.len())
            );
            let params: Vec<Value> = chunk.iter().map(|id| Value::from(*id)).collect();
            deleted += self.execute(&sql, params).await?;
        }
        Ok(deleted)
    }

    /// Number of lemmas of a site
    pub async fn count_lemmas(&self, site_id: i64) -> Result<i64, DbError> {
        self.query_count(
            "SELECT COUNT(*) FROM lemmas WHERE site_id = ?",
            params![site_id],
        )
        .await
    }

    /// Number of lemmas over all sites
    pub async fn count_all_lemmas(&self) -> Result<i64, DbError> {
        self.query_count("SELECT COUNT(*) FROM lemmas", params![])
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::index::Site;
    use crate::index::database::tests::setup_test_db;

    #[tokio::test]
    async fn test_insert_and_find_lemmas() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let site = db
            .save_site(&Site::new("Example", "https://example.com"))
            .await
            .unwrap();

        db.insert_lemmas(
            site.id,
            &[("fox".to_string(), 2), ("dog".to_string(), 1)],
        )
        .await
        .unwrap();

        let mut found = db
            .find_lemmas_by_words(site.id, &["fox".to_string(), "cat".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        let fox = found.pop().unwrap();
        assert_eq!(fox.word, "fox");
        assert_eq!(fox.frequency, 2);

        assert_eq!(db.count_lemmas(site.id).await.unwrap(), 2);
        assert_eq!(db.count_all_lemmas().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_existing_lemma_adds_frequency() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let site = db
            .save_site(&Site::new("Example", "https://example.com"))
            .await
            .unwrap();

        db.insert_lemmas(site.id, &[("fox".to_string(), 1)])
            .await
            .unwrap();
        db.insert_lemmas(site.id, &[("fox".to_string(), 3)])
            .await
            .unwrap();

        let found = db.find_lemmas_by_word("fox").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].frequency, 4);
    }

    #[tokio::test]
    async fn test_update_frequencies_and_delete() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let site = db
            .save_site(&Site::new("Example", "https://example.com"))
            .await
            .unwrap();
        db.insert_lemmas(
            site.id,
            &[("fox".to_string(), 1), ("dog".to_string(), 1)],
        )
        .await
        .unwrap();

        let mut lemmas = db
            .find_lemmas_by_words(site.id, &["fox".to_string(), "dog".to_string()])
            .await
            .unwrap();
        for lemma in &mut lemmas {
            lemma.frequency = if lemma.word == "fox" { 5 } else { 7 };
        }
        assert_eq!(db.update_lemma_frequencies(&lemmas).await.unwrap(), 2);

        let ids: Vec<i64> = lemmas.iter().map(|lemma| lemma.id).collect();
        let reloaded = db.find_lemmas_by_ids(&ids).await.unwrap();
        for lemma in &reloaded {
            let expected = if lemma.word == "fox" { 5 } else { 7 };
            assert_eq!(lemma.frequency, expected);
        }

        assert_eq!(db.delete_lemmas(&ids[..1]).await.unwrap(), 1);
        assert_eq!(db.count_lemmas(site.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_lemmas_are_per_site() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let first = db
            .save_site(&Site::new("First", "https://first.com"))
            .await
            .unwrap();
        let second = db
            .save_site(&Site::new("Second", "https://second.com"))
            .await
            .unwrap();

        db.insert_lemmas(first.id, &[("fox".to_string(), 1)])
            .await
            .unwrap();
        db.insert_lemmas(second.id, &[("fox".to_string(), 2)])
            .await
            .unwrap();

        let found = db.find_lemmas_by_word("fox").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].site_id, first.id);
        assert_eq!(found[1].frequency, 2);
    }
}
