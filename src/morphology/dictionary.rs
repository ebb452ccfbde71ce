//! Closed-class word tables and irregular English forms

use super::{Language, PartOfSpeech};

const RUSSIAN_CONJUNCTIONS: &[&str] = &[
    "и", "а", "но", "или", "да", "что", "чтобы", "если", "когда", "хотя", "либо", "зато",
    "однако", "потому", "поэтому", "будто", "тоже", "также", "ни", "как", "пока", "раз",
];

const RUSSIAN_PREPOSITIONS: &[&str] = &[
    "в", "во", "на", "с", "со", "к", "ко", "о", "об", "обо", "от", "ото", "до", "из", "изо",
    "по", "за", "под", "подо", "над", "надо", "при", "про", "для", "без", "через", "у",
    "перед", "между", "около", "вокруг", "после", "среди", "сквозь", "кроме", "вместо",
];

const RUSSIAN_PARTICLES: &[&str] = &[
    "не", "же", "ли", "бы", "вот", "вон", "лишь", "только", "даже", "уже", "ведь",
    "разве", "неужели", "пусть", "именно", "почти", "еще", "ещё", "уж", "нибудь",
];

const RUSSIAN_PRONOUNS: &[&str] = &[
    "я", "ты", "он", "она", "оно", "мы", "вы", "они", "меня", "тебя", "его", "её", "ее",
    "нас", "вас", "их", "мне", "тебе", "ему", "ей", "нам", "вам", "им", "мной", "тобой",
    "ним", "ней", "ними", "нем", "нём", "себя", "себе", "собой", "мой", "моя", "моё", "мое",
    "мои", "твой", "твоя", "твои", "наш", "наша", "наши", "ваш", "ваша", "ваши", "свой",
    "своя", "свои", "этот", "эта", "это", "эти", "тот", "та", "то", "те", "кто", "что",
    "какой", "какая", "какие", "который", "которая", "которые", "чей", "весь", "вся",
    "всё", "все", "сам", "сама", "сами", "никто", "ничто", "некто", "нечто",
];

const ENGLISH_ARTICLES: &[&str] = &["a", "an", "the"];

const ENGLISH_PREPOSITIONS: &[&str] = &[
    "about", "above", "across", "after", "against", "along", "among", "around", "at",
    "before", "behind", "below", "beneath", "beside", "between", "beyond", "by", "down",
    "during", "except", "for", "from", "in", "inside", "into", "near", "of", "off", "on",
    "onto", "out", "outside", "over", "past", "since", "through", "throughout", "till",
    "to", "toward", "towards", "under", "underneath", "until", "up", "upon", "with",
    "within", "without",
];

const ENGLISH_PRONOUNS: &[&str] = &[
    "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself", "yourselves",
    "he", "him", "his", "himself", "she", "her", "hers", "herself", "it", "its", "itself",
    "we", "us", "our", "ours", "ourselves", "they", "them", "their", "theirs",
    "themselves", "this", "that", "these", "those", "who", "whom", "whose", "which",
    "what", "anyone", "everyone", "someone", "nobody", "nothing", "something",
];

const ENGLISH_CONJUNCTIONS: &[&str] = &[
    "and", "or", "but", "nor", "so", "yet", "because", "although", "though", "if", "unless",
    "while", "whereas", "than", "whether",
];

const ENGLISH_AUXILIARIES: &[&str] = &["be", "am", "is", "are", "was", "were", "been", "being"];

/// Irregular English forms: (surface, base form, surface is also a base form)
const ENGLISH_IRREGULAR: &[(&str, &str, bool)] = &[
    ("saw", "see", true),
    ("left", "leave", true),
    ("found", "find", true),
    ("felt", "feel", true),
    ("rose", "rise", true),
    ("lay", "lie", true),
    ("ground", "grind", true),
    ("went", "go", false),
    ("gone", "go", false),
    ("ran", "run", false),
    ("made", "make", false),
    ("took", "take", false),
    ("taken", "take", false),
    ("gave", "give", false),
    ("given", "give", false),
    ("came", "come", false),
    ("thought", "think", false),
    ("bought", "buy", false),
    ("brought", "bring", false),
    ("taught", "teach", false),
    ("wrote", "write", false),
    ("written", "write", false),
    ("spoke", "speak", false),
    ("spoken", "speak", false),
    ("knew", "know", false),
    ("known", "know", false),
    ("began", "begin", false),
    ("begun", "begin", false),
    ("men", "man", false),
    ("women", "woman", false),
    ("children", "child", false),
    ("mice", "mouse", false),
    ("feet", "foot", false),
    ("teeth", "tooth", false),
    ("geese", "goose", false),
    ("better", "good", false),
    ("best", "good", false),
    ("worse", "bad", false),
    ("worst", "bad", false),
];

fn tag_tables(language: Language) -> &'static [(&'static [&'static str], PartOfSpeech)] {
    match language {
        Language::Russian => &[
            (RUSSIAN_CONJUNCTIONS, PartOfSpeech::Conjunction),
            (RUSSIAN_PREPOSITIONS, PartOfSpeech::Preposition),
            (RUSSIAN_PARTICLES, PartOfSpeech::Particle),
            (RUSSIAN_PRONOUNS, PartOfSpeech::Pronoun),
        ],
        Language::English => &[
            (ENGLISH_ARTICLES, PartOfSpeech::Article),
            (ENGLISH_PREPOSITIONS, PartOfSpeech::Preposition),
            (ENGLISH_PRONOUNS, PartOfSpeech::Pronoun),
            (ENGLISH_CONJUNCTIONS, PartOfSpeech::Conjunction),
            (ENGLISH_AUXILIARIES, PartOfSpeech::Auxiliary),
        ],
    }
}

/// Closed-class tags of a lower-cased word; `Content` when it is in no table
pub(crate) fn closed_class_tags(language: Language, word: &str) -> Vec<PartOfSpeech> {
    let tags: Vec<PartOfSpeech> = tag_tables(language)
        .iter()
        .filter(|(words, _)| words.contains(&word))
        .map(|(_, tag)| *tag)
        .collect();

    if tags.is_empty() {
        vec![PartOfSpeech::Content]
    } else {
        tags
    }
}

/// Irregular base form of an English word and whether the surface form is a
/// base form of its own
pub(crate) fn english_irregular(word: &str) -> Option<(&'static str, bool)> {
    ENGLISH_IRREGULAR
        .iter()
        .find(|(surface, _, _)| *surface == word)
        .map(|(_, base, ambiguous)| (*base, *ambiguous))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_class_tags() {
        assert_eq!(
            closed_class_tags(Language::English, "the"),
            vec![PartOfSpeech::Article]
        );
        assert_eq!(
            closed_class_tags(Language::English, "fox"),
            vec![PartOfSpeech::Content]
        );

        let tags = closed_class_tags(Language::Russian, "что");
        assert!(tags.contains(&PartOfSpeech::Conjunction));
        assert!(tags.contains(&PartOfSpeech::Pronoun));
    }

    #[test]
    fn test_english_irregular() {
        assert_eq!(english_irregular("saw"), Some(("see", true)));
        assert_eq!(english_irregular("children"), Some(("child", false)));
        assert_eq!(english_irregular("fox"), None);
    }
}
