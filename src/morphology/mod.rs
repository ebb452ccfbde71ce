//! # Morphology Engine
//!
//! Normalizes single tokens to their base forms and classifies function words
//! for Russian and English text. The rest of the crate only talks to the
//! [`Morphology`] trait; [`SnowballMorphology`] is the implementation used in
//! production and [`LemmaRanker`] turns whole texts into lemma weights.
//!
//! ## Key Components
//!
//! - `WordKind`: alphabet classification of a token (Cyrillic, Latin, invalid)
//! - `PartOfSpeech`: closed-class grammatical tags used for stop-word filtering
//! - `Morphology`: trait for normal-form lookup and tagging
//! - `SnowballMorphology`: stemming-based implementation with irregular forms
//! - `LemmaRanker`: text → lemma weights and surface word → lemmas maps

mod dictionary;
mod error;
mod ranker;
mod snowball;

pub use error::MorphologyError;
pub use ranker::LemmaRanker;
pub use snowball::SnowballMorphology;

/// Languages understood by the morphology engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Russian,
    English,
}

/// Alphabet classification of a single token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordKind {
    /// Only Cyrillic letters
    Cyrillic,
    /// Only Latin letters
    Latin,
    /// Mixed alphabets, digits or punctuation
    Invalid,
}

impl WordKind {
    /// Classify a token by the alphabet of its letters
    pub fn classify(token: &str) -> Self {
        if token.is_empty() {
            return WordKind::Invalid;
        }
        if token.chars().all(is_cyrillic) {
            WordKind::Cyrillic
        } else if token.chars().all(|c| c.is_ascii_alphabetic()) {
            WordKind::Latin
        } else {
            WordKind::Invalid
        }
    }

    /// Language handling this kind of token, if any
    pub fn language(self) -> Option<Language> {
        match self {
            WordKind::Cyrillic => Some(Language::Russian),
            WordKind::Latin => Some(Language::English),
            WordKind::Invalid => None,
        }
    }
}

fn is_cyrillic(c: char) -> bool {
    matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё')
}

/// Grammatical tags attached to a word form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    /// Any open-class word (noun, verb, adjective, ...)
    Content,
    Conjunction,
    Preposition,
    Particle,
    Pronoun,
    Article,
    /// Forms of "to be"
    Auxiliary,
}

impl PartOfSpeech {
    /// Whether this tag marks a structural word that must not be indexed
    pub fn is_function_for(self, language: Language) -> bool {
        match language {
            Language::Russian => matches!(
                self,
                PartOfSpeech::Conjunction
                    | PartOfSpeech::Preposition
                    | PartOfSpeech::Particle
                    | PartOfSpeech::Pronoun
            ),
            Language::English => matches!(
                self,
                PartOfSpeech::Conjunction
                    | PartOfSpeech::Preposition
                    | PartOfSpeech::Pronoun
                    | PartOfSpeech::Article
                    | PartOfSpeech::Auxiliary
            ),
        }
    }
}

/// Normal-form lookup and tagging for single lower-cased tokens
pub trait Morphology: Send + Sync {
    /// Grammatical tags of the word; open-class words report `Content`
    fn morph_info(&self, word: &str) -> Result<Vec<PartOfSpeech>, MorphologyError>;

    /// Base forms of the word; a word may have more than one
    fn normal_forms(&self, word: &str) -> Result<Vec<String>, MorphologyError>;

    /// Whether the word is a conjunction, preposition, particle, pronoun,
    /// article or auxiliary verb of its language
    fn is_function_word(&self, word: &str) -> Result<bool, MorphologyError> {
        let language = WordKind::classify(word)
            .language()
            .ok_or_else(|| MorphologyError::Unrecognized(word.to_string()))?;
        Ok(self
            .morph_info(word)?
            .into_iter()
            .any(|tag| tag.is_function_for(language)))
    }
}
