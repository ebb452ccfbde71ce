//! Index builder
//!
//! Turns stored pages into lemma frequencies and postings. Every lemma
//! mutation of a site runs under that site's lock, because frequency updates
//! are read-modify-write sequences over several statements. Different sites
//! index concurrently.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::crawler::content_extraction::extract_text;
use crate::index::{Database, DbError, Lemma, NewPage, Page};
use crate::morphology::LemmaRanker;

/// Counts of one `index_pages` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub pages: usize,
    pub lemmas_created: usize,
    pub lemmas_updated: usize,
    pub postings: usize,
}

/// Builds and removes inverted-index entries
#[derive(Clone)]
pub struct IndexBuilder {
    db: Database,
    ranker: LemmaRanker,
    site_locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl IndexBuilder {
    pub fn new(db: Database, ranker: LemmaRanker) -> Self {
        Self {
            db,
            ranker,
            site_locks: Arc::new(DashMap::new()),
        }
    }

    pub fn ranker(&self) -> &LemmaRanker {
        &self.ranker
    }

    pub(crate) fn site_lock(&self, site_id: i64) -> Arc<Mutex<()>> {
        self.site_locks
            .entry(site_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn rank(&self, content: &str) -> HashMap<String, f64> {
        self.ranker.rank_lemmas(&extract_text(content))
    }

    /// Index a batch of stored, not yet indexed pages of one site.
    ///
    /// A lemma found on several pages of the batch has its frequency raised by
    /// the number of those pages. Postings are written once lemma IDs are
    /// stable, with the in-page weight as rank.
    #[instrument(skip(self, pages), fields(pages = pages.len()))]
    pub async fn index_pages(&self, site_id: i64, pages: &[Page]) -> Result<IndexSummary, DbError> {
        let ranked: Vec<(i64, HashMap<String, f64>)> = pages
            .iter()
            .map(|page| (page.id, self.rank(&page.content)))
            .collect();

        let lock = self.site_lock(site_id);
        let _guard = lock.lock().await;
        self.write_index(site_id, ranked).await
    }

    /// Store and index fetched pages of one site, replacing the pages already
    /// stored at the same paths.
    ///
    /// Removal of the previous versions, insertion and indexing all run under
    /// the site's lock. When a path occurs twice the last page wins.
    #[instrument(skip(self, pages), fields(pages = pages.len()))]
    pub async fn store_pages(
        &self,
        site_id: i64,
        pages: Vec<NewPage>,
    ) -> Result<(Vec<Page>, IndexSummary), DbError> {
        let mut seen = HashSet::new();
        let mut pages: Vec<NewPage> = pages
            .into_iter()
            .rev()
            .filter(|page| seen.insert(page.path.clone()))
            .collect();
        pages.reverse();

        let ranks: Vec<HashMap<String, f64>> =
            pages.iter().map(|page| self.rank(&page.content)).collect();
        let paths: Vec<String> = pages.iter().map(|page| page.path.clone()).collect();

        let lock = self.site_lock(site_id);
        let _guard = lock.lock().await;

        let previous = self.db.find_pages_by_paths(site_id, &paths).await?;
        for page in &previous {
            self.remove_locked(page).await?;
        }

        let saved = self.db.save_pages(&pages).await?;
        let ranked: Vec<(i64, HashMap<String, f64>)> =
            saved.iter().map(|page| page.id).zip(ranks).collect();
        let summary = self.write_index(site_id, ranked).await?;

        if !previous.is_empty() {
            debug!("Replaced {} pages of site {}", previous.len(), site_id);
        }
        Ok((saved, summary))
    }

    async fn write_index(
        &self,
        site_id: i64,
        ranked: Vec<(i64, HashMap<String, f64>)>,
    ) -> Result<IndexSummary, DbError> {
        let mut page_counts: HashMap<&str, i64> = HashMap::new();
        for (_, ranks) in &ranked {
            for word in ranks.keys() {
                *page_counts.entry(word.as_str()).or_insert(0) += 1;
            }
        }

        let mut summary = IndexSummary {
            pages: ranked.len(),
            ..Default::default()
        };
        if page_counts.is_empty() {
            return Ok(summary);
        }

        let words: Vec<String> = page_counts.keys().map(|word| word.to_string()).collect();

        let mut existing = self.db.find_lemmas_by_words(site_id, &words).await?;
        for lemma in &mut existing {
            lemma.frequency += page_counts.get(lemma.word.as_str()).copied().unwrap_or(0);
        }
        self.db.update_lemma_frequencies(&existing).await?;
        summary.lemmas_updated = existing.len();

        let known: HashSet<&str> = existing.iter().map(|lemma| lemma.word.as_str()).collect();
        let created: Vec<(String, i64)> = page_counts
            .iter()
            .filter(|(word, _)| !known.contains(*word))
            .map(|(word, count)| (word.to_string(), *count))
            .collect();
        self.db.insert_lemmas(site_id, &created).await?;
        summary.lemmas_created = created.len();

        let ids: HashMap<String, i64> = self
            .db
            .find_lemmas_by_words(site_id, &words)
            .await?
            .into_iter()
            .map(|lemma| (lemma.word, lemma.id))
            .collect();

        let mut postings = Vec::new();
        for (page_id, ranks) in &ranked {
            for (word, rank) in ranks {
                let lemma_id = ids.get(word).ok_or_else(|| {
                    DbError::Data(format!("Lemma '{}' missing after insert", word))
                })?;
                postings.push((*page_id, *lemma_id, *rank));
            }
        }
        self.db.save_postings(&postings).await?;
        summary.postings = postings.len();

        debug!(
            "Indexed {} pages of site {}: {} new lemmas, {} updated, {} postings",
            summary.pages, site_id, summary.lemmas_created, summary.lemmas_updated, summary.postings
        );
        Ok(summary)
    }

    /// Remove a page and its postings, decrementing the frequency of every
    /// lemma it contained and dropping lemmas no page contains any more
    #[instrument(skip(self, page), fields(site_id = page.site_id, path = %page.path))]
    pub async fn remove_page(&self, page: &Page) -> Result<(), DbError> {
        let lock = self.site_lock(page.site_id);
        let _guard = lock.lock().await;
        self.remove_locked(page).await
    }

    async fn remove_locked(&self, page: &Page) -> Result<(), DbError> {
        let postings = self.db.find_postings_by_page(page.id).await?;
        let lemma_ids: Vec<i64> = postings.iter().map(|posting| posting.lemma_id).collect();
        let lemmas = self.db.find_lemmas_by_ids(&lemma_ids).await?;

        let (gone, kept): (Vec<Lemma>, Vec<Lemma>) = lemmas
            .into_iter()
            .map(|lemma| Lemma {
                frequency: lemma.frequency - 1,
                ..lemma
            })
            .partition(|lemma| lemma.frequency <= 0);

        self.db.update_lemma_frequencies(&kept).await?;
        let gone: Vec<i64> = gone.iter().map(|lemma| lemma.id).collect();
        self.db.delete_lemmas(&gone).await?;
        self.db.delete_postings_by_page(page.id).await?;
        self.db.delete_page_by_id(page.id).await?;

        debug!(
            "Removed page {}: {} lemmas decremented, {} deleted",
            page.id,
            kept.len(),
            gone.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::index::database::tests::setup_test_db;
    use crate::index::{NewPage, Site};
    use libsql::params;

    async fn store(db: &Database, site_id: i64, path: &str, body: &str) -> Page {
        db.save_page(&NewPage {
            site_id,
            path: path.to_string(),
            code: 200,
            content: format!("<html><body>{}</body></html>", body),
        })
        .await
        .unwrap()
    }

    async fn frequency(db: &Database, site_id: i64, word: &str) -> Option<i64> {
        db.find_lemmas_by_words(site_id, &[word.to_string()])
            .await
            .unwrap()
            .first()
            .map(|lemma| lemma.frequency)
    }

    async fn assert_frequencies_match_postings(db: &Database) {
        let mismatched = db
            .query_count(
                "SELECT COUNT(*) FROM lemmas l
                 WHERE l.frequency != (SELECT COUNT(*) FROM postings p WHERE p.lemma_id = l.id)",
                params![],
            )
            .await
            .unwrap();
        assert_eq!(mismatched, 0);
    }

    #[tokio::test]
    async fn test_lemma_on_two_pages_of_one_batch() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let site = db
            .save_site(&Site::new("Example", "https://example.com"))
            .await
            .unwrap();
        let builder = IndexBuilder::new(db.clone(), LemmaRanker::default());

        let first = store(&db, site.id, "/a", "fox fox dog").await;
        let second = store(&db, site.id, "/b", "fox cat").await;

        let summary = builder
            .index_pages(site.id, &[first.clone(), second.clone()])
            .await
            .unwrap();
        assert_eq!(summary.pages, 2);
        assert_eq!(summary.lemmas_created, 3);
        assert_eq!(summary.postings, 4);

        assert_eq!(frequency(&db, site.id, "fox").await, Some(2));
        assert_eq!(frequency(&db, site.id, "dog").await, Some(1));
        assert_eq!(db.get_rank(first.id, "fox").await.unwrap(), Some(2.0));
        assert_eq!(db.get_rank(second.id, "fox").await.unwrap(), Some(1.0));
        assert_frequencies_match_postings(&db).await;
    }

    #[tokio::test]
    async fn test_later_batch_increments_existing_lemmas() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let site = db
            .save_site(&Site::new("Example", "https://example.com"))
            .await
            .unwrap();
        let builder = IndexBuilder::new(db.clone(), LemmaRanker::default());

        let first = store(&db, site.id, "/a", "fox dog").await;
        builder.index_pages(site.id, &[first]).await.unwrap();

        let second = store(&db, site.id, "/b", "fox").await;
        let summary = builder.index_pages(site.id, &[second]).await.unwrap();

        assert_eq!(summary.lemmas_updated, 1);
        assert_eq!(summary.lemmas_created, 0);
        assert_eq!(frequency(&db, site.id, "fox").await, Some(2));
        assert_frequencies_match_postings(&db).await;
    }

    #[tokio::test]
    async fn test_concurrent_batches_of_one_site() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let site = db
            .save_site(&Site::new("Example", "https://example.com"))
            .await
            .unwrap();
        let builder = IndexBuilder::new(db.clone(), LemmaRanker::default());

        let first = store(&db, site.id, "/a", "fox").await;
        let second = store(&db, site.id, "/b", "fox").await;

        let (a, b) = tokio::join!(
            builder.index_pages(site.id, std::slice::from_ref(&first)),
            builder.index_pages(site.id, std::slice::from_ref(&second)),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(frequency(&db, site.id, "fox").await, Some(2));
        assert_frequencies_match_postings(&db).await;
    }

    #[tokio::test]
    async fn test_remove_and_reindex_page() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let site = db
            .save_site(&Site::new("Example", "https://example.com"))
            .await
            .unwrap();
        let builder = IndexBuilder::new(db.clone(), LemmaRanker::default());

        let first = store(&db, site.id, "/a", "fox fox dog").await;
        let second = store(&db, site.id, "/b", "fox").await;
        builder
            .index_pages(site.id, &[first.clone(), second])
            .await
            .unwrap();
        let ranks_before = db.find_postings_by_page(first.id).await.unwrap();

        builder.remove_page(&first).await.unwrap();

        assert_eq!(frequency(&db, site.id, "fox").await, Some(1));
        assert_eq!(frequency(&db, site.id, "dog").await, None);
        assert!(db.find_page(site.id, "/a").await.unwrap().is_none());
        assert!(db.find_postings_by_page(first.id).await.unwrap().is_empty());
        assert_frequencies_match_postings(&db).await;

        let again = store(&db, site.id, "/a", "fox fox dog").await;
        builder.index_pages(site.id, &[again.clone()]).await.unwrap();

        let mut before: Vec<f64> = ranks_before.iter().map(|posting| posting.rank).collect();
        let mut after: Vec<f64> = db
            .find_postings_by_page(again.id)
            .await
            .unwrap()
            .iter()
            .map(|posting| posting.rank)
            .collect();
        before.sort_by(|a, b| a.total_cmp(b));
        after.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(before, after);
        assert_eq!(frequency(&db, site.id, "fox").await, Some(2));
        assert_frequencies_match_postings(&db).await;
    }

    #[tokio::test]
    async fn test_page_without_words() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let site = db
            .save_site(&Site::new("Example", "https://example.com"))
            .await
            .unwrap();
        let builder = IndexBuilder::new(db.clone(), LemmaRanker::default());

        let page = store(&db, site.id, "/empty", "1 2 3").await;
        let summary = builder.index_pages(site.id, &[page]).await.unwrap();

        assert_eq!(summary.postings, 0);
        assert_eq!(db.count_lemmas(site.id).await.unwrap(), 0);
    }

    fn fetched(site_id: i64, path: &str, body: &str) -> NewPage {
        NewPage {
            site_id,
            path: path.to_string(),
            code: 200,
            content: format!("<html><body>{}</body></html>", body),
        }
    }

    #[tokio::test]
    async fn test_store_pages_replaces_stored_path() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let site = db
            .save_site(&Site::new("Example", "https://example.com"))
            .await
            .unwrap();
        let builder = IndexBuilder::new(db.clone(), LemmaRanker::default());

        let (first, _) = builder
            .store_pages(site.id, vec![fetched(site.id, "/a", "fox dog")])
            .await
            .unwrap();
        let (second, summary) = builder
            .store_pages(
                site.id,
                vec![
                    fetched(site.id, "/a", "fox cat cat"),
                    fetched(site.id, "/b", "fox"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(summary.pages, 2);
        assert_ne!(first[0].id, second[0].id);
        assert_eq!(db.count_pages(site.id).await.unwrap(), 2);
        assert_eq!(frequency(&db, site.id, "fox").await, Some(2));
        assert_eq!(frequency(&db, site.id, "dog").await, None);
        assert_eq!(db.get_rank(second[0].id, "cat").await.unwrap(), Some(2.0));
        assert_frequencies_match_postings(&db).await;
    }

    #[tokio::test]
    async fn test_store_pages_keeps_last_duplicate() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let site = db
            .save_site(&Site::new("Example", "https://example.com"))
            .await
            .unwrap();
        let builder = IndexBuilder::new(db.clone(), LemmaRanker::default());

        let (saved, _) = builder
            .store_pages(
                site.id,
                vec![fetched(site.id, "/a", "dog"), fetched(site.id, "/a", "fox")],
            )
            .await
            .unwrap();

        assert_eq!(saved.len(), 1);
        assert_eq!(frequency(&db, site.id, "fox").await, Some(1));
        assert_eq!(frequency(&db, site.id, "dog").await, None);
        assert_frequencies_match_postings(&db).await;
    }

    #[tokio::test]
    async fn test_concurrent_stores_of_one_path() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let site = db
            .save_site(&Site::new("Example", "https://example.com"))
            .await
            .unwrap();
        let builder = IndexBuilder::new(db.clone(), LemmaRanker::default());

        let (a, b) = tokio::join!(
            builder.store_pages(site.id, vec![fetched(site.id, "/a", "fox dog")]),
            builder.store_pages(site.id, vec![fetched(site.id, "/a", "fox dog")]),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(db.count_pages(site.id).await.unwrap(), 1);
        assert_eq!(frequency(&db, site.id, "fox").await, Some(1));
        assert_frequencies_match_postings(&db).await;
    }
}
