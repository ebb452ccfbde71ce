//! Ranked full-text search over the lemma index

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::error::SearchError;
use super::snippet::build_snippet;
use crate::crawler::content_extraction::{extract_text, extract_title};
use crate::index::{Database, Page, Site};
use crate::morphology::LemmaRanker;

/// Options for search queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Restrict results to the site with this root URL
    pub site: Option<String>,

    /// Number of ranked results to skip
    pub offset: usize,

    /// Maximum number of results to return
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            site: None,
            offset: 0,
            limit: 20,
        }
    }
}

/// One ranked page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Root URL of the page's site
    pub site: String,

    #[serde(rename = "siteName")]
    pub site_name: String,

    /// Site-relative path of the page
    pub uri: String,

    pub title: String,

    /// Context around the query words, highlighted with `<b>`
    pub snippet: String,

    /// Relevance relative to the best match, in (0, 1]
    pub relevance: f64,
}

/// A page of ranked results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Number of matching pages before offset and limit
    pub count: usize,

    pub data: Vec<SearchResult>,
}

/// Search engine over the index
#[derive(Clone)]
pub struct SearchEngine {
    db: Database,
    ranker: LemmaRanker,
}

impl SearchEngine {
    pub fn new(db: Database, ranker: LemmaRanker) -> Self {
        Self { db, ranker }
    }

    /// Search the index with the given query and options
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResponse, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if options.limit == 0 {
            return Err(SearchError::InvalidParameters(
                "limit must be positive".to_string(),
            ));
        }

        let query_lemmas = self.ranker.lemma_set(query);
        if query_lemmas.is_empty() {
            debug!("Query '{}' has no searchable words", query);
            return Ok(SearchResponse::default());
        }

        let site_id = match &options.site {
            Some(url) => match self.db.find_site_by_url(url.trim_end_matches('/')).await? {
                Some(site) => Some(site.id),
                None => {
                    debug!("Unknown site filter {}", url);
                    return Ok(SearchResponse::default());
                }
            },
            None => None,
        };

        let Some(ranked) = self.rank_pages(&query_lemmas, site_id).await? else {
            return Ok(SearchResponse::default());
        };

        let count = ranked.len();
        let selected: Vec<(i64, f64)> = ranked
            .into_iter()
            .skip(options.offset)
            .take(options.limit)
            .collect();

        let page_ids: Vec<i64> = selected.iter().map(|(page_id, _)| *page_id).collect();
        let pages: HashMap<i64, Page> = self
            .db
            .find_pages_by_ids(&page_ids)
            .await?
            .into_iter()
            .map(|page| (page.id, page))
            .collect();

        let mut sites: HashMap<i64, Site> = HashMap::new();
        let mut data = Vec::with_capacity(selected.len());
        for (page_id, relevance) in selected {
            let Some(page) = pages.get(&page_id) else {
                continue;
            };
            if !sites.contains_key(&page.site_id) {
                if let Some(site) = self.db.find_site(page.site_id).await? {
                    sites.insert(site.id, site);
                }
            }
            let Some(site) = sites.get(&page.site_id) else {
                continue;
            };

            data.push(SearchResult {
                site: site.url.clone(),
                site_name: site.name.clone(),
                uri: page.path.clone(),
                title: extract_title(&page.content),
                snippet: self.snippet(&page.content, &query_lemmas),
                relevance,
            });
        }

        debug!("Query '{}' matched {} pages", query, count);
        Ok(SearchResponse { count, data })
    }

    /// Candidate pages with relative relevance, best first.
    ///
    /// `None` when some query lemma is absent or the candidates do not
    /// intersect.
    async fn rank_pages(
        &self,
        query_lemmas: &HashSet<String>,
        site_id: Option<i64>,
    ) -> Result<Option<Vec<(i64, f64)>>, SearchError> {
        let mut lemmas = Vec::with_capacity(query_lemmas.len());
        for word in query_lemmas {
            let rows: Vec<_> = self
                .db
                .find_lemmas_by_word(word)
                .await?
                .into_iter()
                .filter(|lemma| site_id.is_none_or(|id| lemma.site_id == id))
                .collect();
            if rows.is_empty() {
                debug!("Lemma '{}' is not indexed", word);
                return Ok(None);
            }
            let total: i64 = rows.iter().map(|lemma| lemma.frequency).sum();
            lemmas.push((total, word.as_str()));
        }
        // Rarest first keeps the candidate set small
        lemmas.sort();

        let mut candidates: Vec<i64> = Vec::new();
        let mut relevance: HashMap<i64, f64> = HashMap::new();
        for (index, (_, word)) in lemmas.iter().enumerate() {
            let postings = self.db.find_postings_by_word(word, site_id).await?;
            let ranks: HashMap<i64, f64> = postings
                .iter()
                .map(|posting| (posting.page_id, posting.rank))
                .collect();

            if index == 0 {
                let mut seen = HashSet::new();
                candidates.extend(
                    postings
                        .iter()
                        .map(|posting| posting.page_id)
                        .filter(|page_id| seen.insert(*page_id)),
                );
            } else {
                candidates.retain(|page_id| ranks.contains_key(page_id));
            }

            for page_id in &candidates {
                *relevance.entry(*page_id).or_insert(0.0) += ranks.get(page_id).copied().unwrap_or(0.0);
            }
            if candidates.is_empty() {
                return Ok(None);
            }
        }

        let max = candidates
            .iter()
            .filter_map(|page_id| relevance.get(page_id))
            .fold(0.0_f64, |max, value| max.max(*value));
        if max <= 0.0 {
            return Ok(None);
        }

        let mut ranked: Vec<(i64, f64)> = candidates
            .into_iter()
            .map(|page_id| (page_id, relevance.get(&page_id).copied().unwrap_or(0.0) / max))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(Some(ranked))
    }

    fn snippet(&self, html: &str, query_lemmas: &HashSet<String>) -> String {
        let text = extract_text(html);
        let words: Vec<String> = self
            .ranker
            .map_words_to_lemmas(&text)
            .into_iter()
            .filter(|(_, lemmas)| lemmas.iter().any(|lemma| query_lemmas.contains(lemma)))
            .map(|(word, _)| word)
            .collect();
        build_snippet(&text, &words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::index::database::tests::setup_test_db;
    use crate::index::{IndexBuilder, NewPage};

    async fn index(db: &Database, url: &str, pages: &[(&str, &str)]) -> Site {
        let site = db.save_site(&Site::new(url, url)).await.unwrap();
        let new_pages: Vec<NewPage> = pages
            .iter()
            .map(|(path, body)| NewPage {
                site_id: site.id,
                path: path.to_string(),
                code: 200,
                content: format!(
                    "<html><head><title>{}</title></head><body>{}</body></html>",
                    path, body
                ),
            })
            .collect();
        let saved = db.save_pages(&new_pages).await.unwrap();
        IndexBuilder::new(db.clone(), LemmaRanker::default())
            .index_pages(site.id, &saved)
            .await
            .unwrap();
        site
    }

    fn engine(db: &Database) -> SearchEngine {
        SearchEngine::new(db.clone(), LemmaRanker::default())
    }

    #[tokio::test]
    async fn test_relative_relevance_order() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        index(
            &db,
            "https://example.com",
            &[("/b", "fox fox"), ("/a", "fox fox fox fox"), ("/c", "dog")],
        )
        .await;

        let response = engine(&db)
            .search("fox", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(response.count, 2);
        let uris: Vec<&str> = response.data.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(uris, vec!["/a", "/b"]);
        let relevance: Vec<f64> = response.data.iter().map(|r| r.relevance).collect();
        assert_eq!(relevance, vec![1.0, 0.5]);

        let top = &response.data[0];
        assert_eq!(top.site, "https://example.com");
        assert_eq!(top.title, "/a");
        assert!(top.snippet.contains("<b>fox</b>"));
    }

    #[tokio::test]
    async fn test_all_query_lemmas_must_match() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        index(
            &db,
            "https://example.com",
            &[("/fox", "fox"), ("/both", "fox dog dog"), ("/dog", "dog")],
        )
        .await;

        let response = engine(&db)
            .search("fox dogs", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(response.count, 1);
        assert_eq!(response.data[0].uri, "/both");
        assert_eq!(response.data[0].relevance, 1.0);
        assert!(response.data[0].snippet.contains("<b>fox</b>"));
        assert!(response.data[0].snippet.contains("<b>dog</b>"));
    }

    #[tokio::test]
    async fn test_absent_lemma_gives_empty_success() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        index(&db, "https://example.com", &[("/a", "fox")]).await;

        let response = engine(&db)
            .search("fox unicorn", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(response, SearchResponse::default());
    }

    #[tokio::test]
    async fn test_empty_query() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();

        let result = engine(&db).search("   ", &SearchOptions::default()).await;

        assert!(matches!(result, Err(SearchError::EmptyQuery)));
        assert_eq!(
            result.unwrap_err().to_string(),
            "empty search query"
        );
    }

    #[tokio::test]
    async fn test_site_filter() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        index(&db, "https://first.com", &[("/a", "fox")]).await;
        index(&db, "https://second.com", &[("/b", "fox fox")]).await;

        let all = engine(&db)
            .search("fox", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(all.count, 2);

        let options = SearchOptions {
            site: Some("https://first.com/".to_string()),
            ..Default::default()
        };
        let filtered = engine(&db).search("fox", &options).await.unwrap();
        assert_eq!(filtered.count, 1);
        assert_eq!(filtered.data[0].site, "https://first.com");
        assert_eq!(filtered.data[0].relevance, 1.0);

        let unknown = SearchOptions {
            site: Some("https://third.com".to_string()),
            ..Default::default()
        };
        assert_eq!(engine(&db).search("fox", &unknown).await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn test_offset_and_limit() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        index(
            &db,
            "https://example.com",
            &[("/a", "fox fox fox"), ("/b", "fox fox"), ("/c", "fox")],
        )
        .await;

        let options = SearchOptions {
            offset: 1,
            limit: 1,
            ..Default::default()
        };
        let response = engine(&db).search("fox", &options).await.unwrap();

        assert_eq!(response.count, 3);
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].uri, "/b");

        let zero = SearchOptions {
            limit: 0,
            ..Default::default()
        };
        assert!(matches!(
            engine(&db).search("fox", &zero).await,
            Err(SearchError::InvalidParameters(_))
        ));
    }

    #[tokio::test]
    async fn test_ties_keep_discovery_order() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        index(
            &db,
            "https://example.com",
            &[("/first", "fox"), ("/second", "fox"), ("/third", "fox")],
        )
        .await;

        let response = engine(&db)
            .search("fox", &SearchOptions::default())
            .await
            .unwrap();

        let uris: Vec<&str> = response.data.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(uris, vec!["/first", "/second", "/third"]);
    }
}
