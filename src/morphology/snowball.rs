//! Snowball stemming backed morphology

use std::fmt;

use rust_stemmers::{Algorithm, Stemmer};

use super::dictionary::{closed_class_tags, english_irregular};
use super::{Language, Morphology, MorphologyError, PartOfSpeech, WordKind};

/// Morphology built on the Snowball stemmers for Russian and English.
///
/// Normal forms are stems, so a query word and every inflected form of it in
/// page text collapse to the same key. Irregular English forms resolve to the
/// stem of their dictionary base; forms that are also words of their own
/// ("saw", "left") resolve to both.
pub struct SnowballMorphology {
    russian: Stemmer,
    english: Stemmer,
}

impl fmt::Debug for SnowballMorphology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowballMorphology").finish_non_exhaustive()
    }
}

impl Default for SnowballMorphology {
    fn default() -> Self {
        Self::new()
    }
}

impl SnowballMorphology {
    pub fn new() -> Self {
        Self {
            russian: Stemmer::create(Algorithm::Russian),
            english: Stemmer::create(Algorithm::English),
        }
    }

    fn language_of(word: &str) -> Result<Language, MorphologyError> {
        WordKind::classify(word)
            .language()
            .ok_or_else(|| MorphologyError::Unrecognized(word.to_string()))
    }

    fn english_forms(&self, word: &str) -> Vec<String> {
        match english_irregular(word) {
            Some((base, true)) => {
                let mut forms = vec![self.english.stem(word).into_owned()];
                let base = self.english.stem(base).into_owned();
                if !forms.contains(&base) {
                    forms.push(base);
                }
                forms
            }
            Some((base, false)) => vec![self.english.stem(base).into_owned()],
            None => vec![self.english.stem(word).into_owned()],
        }
    }
}

impl Morphology for SnowballMorphology {
    fn morph_info(&self, word: &str) -> Result<Vec<PartOfSpeech>, MorphologyError> {
        let language = Self::language_of(word)?;
        let word = word.to_lowercase().replace('ё', "е");
        Ok(closed_class_tags(language, &word))
    }

    fn normal_forms(&self, word: &str) -> Result<Vec<String>, MorphologyError> {
        let language = Self::language_of(word)?;
        let word = word.to_lowercase();
        let forms = match language {
            Language::Russian => {
                let folded = word.replace('ё', "е");
                vec![self.russian.stem(&folded).replace('ё', "е")]
            }
            Language::English => self.english_forms(&word),
        };
        Ok(forms)
    }
}
