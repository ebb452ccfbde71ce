//! Text level lemma extraction

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;

use super::{Morphology, SnowballMorphology};

static WORD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z'А-Яа-яЁё]+").expect("word separator pattern is valid"));

/// Turns raw text into lemma weights and surface-word lemma maps
#[derive(Clone)]
pub struct LemmaRanker {
    morphology: Arc<dyn Morphology>,
}

impl Default for LemmaRanker {
    fn default() -> Self {
        Self::new(Arc::new(SnowballMorphology::new()))
    }
}

impl LemmaRanker {
    pub fn new(morphology: Arc<dyn Morphology>) -> Self {
        Self { morphology }
    }

    /// Map every lemma in `text` to the number of times it occurs.
    ///
    /// A token with several normal forms adds one to each of them.
    pub fn rank_lemmas(&self, text: &str) -> HashMap<String, f64> {
        let mut ranks: HashMap<String, f64> = HashMap::new();
        for word in split_words(text) {
            if let Some(forms) = self.lemmas_of(word) {
                for form in forms {
                    *ranks.entry(form).or_insert(0.0) += 1.0;
                }
            }
        }
        ranks
    }

    /// Map every surface word in `text` to its lemmas; a repeated word keeps the
    /// last lookup
    pub fn map_words_to_lemmas(&self, text: &str) -> HashMap<String, Vec<String>> {
        let mut words = HashMap::new();
        for word in split_words(text) {
            if let Some(forms) = self.lemmas_of(word) {
                words.insert(word.to_string(), forms);
            }
        }
        words
    }

    /// Distinct lemmas of `text`
    pub fn lemma_set(&self, text: &str) -> HashSet<String> {
        self.rank_lemmas(text).into_keys().collect()
    }

    fn lemmas_of(&self, word: &str) -> Option<Vec<String>> {
        let word = word.to_lowercase();
        match self.morphology.is_function_word(&word) {
            Ok(true) => return None,
            Ok(false) => {}
            Err(e) => {
                debug!("Skipping token: {}", e);
                return None;
            }
        }
        match self.morphology.normal_forms(&word) {
            Ok(forms) => Some(forms),
            Err(e) => {
                debug!("Skipping token: {}", e);
                None
            }
        }
    }
}

fn split_words(text: &str) -> impl Iterator<Item = &str> {
    WORD_SEPARATOR
        .split(text)
        .filter(|word| word.chars().count() >= 2 && !word.contains('\''))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morphology::{MorphologyError, PartOfSpeech};

    /// Identity morphology that gives "many" two forms
    struct StubMorphology;

    impl Morphology for StubMorphology {
        fn morph_info(&self, word: &str) -> Result<Vec<PartOfSpeech>, MorphologyError> {
            if word.chars().any(|c| c.is_ascii_digit()) {
                return Err(MorphologyError::Unrecognized(word.to_string()));
            }
            Ok(if word == "the" {
                vec![PartOfSpeech::Article]
            } else {
                vec![PartOfSpeech::Content]
            })
        }

        fn normal_forms(&self, word: &str) -> Result<Vec<String>, MorphologyError> {
            if word == "many" {
                Ok(vec!["many".to_string(), "much".to_string()])
            } else {
                Ok(vec![word.to_string()])
            }
        }
    }

    fn stub_ranker() -> LemmaRanker {
        LemmaRanker::new(Arc::new(StubMorphology))
    }

    #[test]
    fn test_rank_counts_occurrences() {
        let ranks = stub_ranker().rank_lemmas("Fox, fox! The fox and a dog.");
        assert_eq!(ranks.get("fox"), Some(&3.0));
        assert_eq!(ranks.get("dog"), Some(&1.0));
        assert_eq!(ranks.get("and"), Some(&1.0));
        assert!(!ranks.contains_key("the"));
        // single letters are dropped
        assert!(!ranks.contains_key("a"));
    }

    #[test]
    fn test_every_normal_form_gets_weight() {
        let ranks = stub_ranker().rank_lemmas("many many much");
        assert_eq!(ranks.get("many"), Some(&2.0));
        assert_eq!(ranks.get("much"), Some(&3.0));
    }

    #[test]
    fn test_apostrophes_and_mixed_tokens_are_skipped() {
        let ranks = stub_ranker().rank_lemmas("don't stop лисаfox");
        assert!(!ranks.contains_key("don't"));
        assert!(ranks.contains_key("stop"));
        assert_eq!(ranks.len(), 1);
    }

    #[test]
    fn test_word_map_keeps_surface_form() {
        let words = stub_ranker().map_words_to_lemmas("Fox jumps over the fox");
        assert_eq!(words.get("Fox"), Some(&vec!["fox".to_string()]));
        assert_eq!(words.get("fox"), Some(&vec!["fox".to_string()]));
        assert!(!words.contains_key("the"));
    }

    #[test]
    fn test_snowball_ranker() {
        let ranker = LemmaRanker::default();
        let ranks = ranker.rank_lemmas("the quick brown fox jumps over the lazy dog");
        assert!(!ranks.contains_key("the"));
        assert!(!ranks.contains_key("over"));
        assert_eq!(ranks.get("fox"), Some(&1.0));

        let ranks = ranker.rank_lemmas("Лиса прыгает. Лисы прыгают через забор");
        assert_eq!(ranks.get("лис"), Some(&2.0));
        assert!(!ranks.keys().any(|lemma| lemma == "через"));
    }
}
