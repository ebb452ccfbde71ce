//! Snippet synthesis
//!
//! Offsets are counted in characters, not bytes, so Cyrillic text is cut on
//! character boundaries.

use std::collections::HashSet;

use regex::RegexBuilder;
use tracing::debug;

/// Characters of context shared by all highlighted words
const CONTEXT_CHARS: usize = 80;

const ELLIPSIS: &str = "...";

fn is_word_char(c: char) -> bool {
    c.is_alphabetic() || c == '\''
}

/// Character ranges of the first whole-word occurrence of each of `words`,
/// in text order
fn first_occurrences(text: &str, words: &[String]) -> Vec<(usize, usize)> {
    let mut words: Vec<&str> = words
        .iter()
        .map(String::as_str)
        .filter(|word| !word.is_empty())
        .collect();
    if words.is_empty() {
        return Vec::new();
    }
    // Longest first so a word is never shadowed by its own prefix
    words.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    words.dedup();

    let pattern = words
        .iter()
        .map(|word| regex::escape(word))
        .collect::<Vec<_>>()
        .join("|");
    let matcher = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(matcher) => matcher,
        Err(e) => {
            debug!("Failed to build snippet pattern: {}", e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut ranges = Vec::new();
    for found in matcher.find_iter(text) {
        let before = text[..found.start()].chars().next_back();
        let after = text[found.end()..].chars().next();
        if before.is_some_and(is_word_char) || after.is_some_and(is_word_char) {
            continue;
        }
        if !seen.insert(found.as_str().to_lowercase()) {
            continue;
        }
        let start = text[..found.start()].chars().count();
        ranges.push((start, start + found.as_str().chars().count()));
    }
    ranges
}

/// Highlight the first occurrence of every word of `words` in `text` with
/// `<b>` tags and surrounding context.
///
/// `words` are the page's distinct surface words matching the query; the
/// context is split evenly between them.
///
/// Returns an empty string when none of the words occurs.
pub fn build_snippet(text: &str, words: &[String]) -> String {
    let matches = first_occurrences(text, words);
    let Some(&(first_start, first_end)) = matches.first() else {
        return String::new();
    };

    let chars: Vec<char> = text.chars().collect();
    let slice = |from: usize, to: usize| -> String {
        chars[from.min(chars.len())..to.min(chars.len())]
            .iter()
            .collect()
    };
    // Shared by every distinct surface word found on the page, highlighted or not
    let distinct: HashSet<&str> = words
        .iter()
        .map(String::as_str)
        .filter(|word| !word.is_empty())
        .collect();
    let window = (CONTEXT_CHARS / distinct.len().max(1)).max(1);

    let mut snippet = String::from(ELLIPSIS);
    snippet.push_str(&slice(first_start.saturating_sub(window), first_start));
    snippet.push_str(&format!("<b>{}</b>", slice(first_start, first_end)));
    let mut last_end = first_end;

    for &(start, end) in &matches[1..] {
        if start - last_end > 2 * window {
            snippet.push_str(&slice(last_end, last_end + window));
            snippet.push_str(ELLIPSIS);
            snippet.push_str(&slice(start - window, start));
        } else {
            snippet.push_str(&slice(last_end, start));
        }
        snippet.push_str(&format!("<b>{}</b>", slice(start, end)));
        last_end = end;
    }

    if last_end + window < chars.len() {
        snippet.push_str(&slice(last_end, last_end + window));
        snippet.push_str(ELLIPSIS);
    } else {
        snippet.push_str(&slice(last_end, chars.len()));
    }
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|word| word.to_string()).collect()
    }

    #[test]
    fn test_single_word() {
        let text = "the quick brown fox jumps over the lazy dog";
        let snippet = build_snippet(text, &words(&["fox"]));

        assert_eq!(snippet, "...the quick brown <b>fox</b> jumps over the lazy dog");
        assert!(snippet.len() <= text.len() + "<b></b>".len() + ELLIPSIS.len());
    }

    #[test]
    fn test_case_insensitive_whole_words() {
        let text = "Foxes and a Fox";
        let snippet = build_snippet(text, &words(&["fox"]));

        assert_eq!(snippet, "...Foxes and a <b>Fox</b>");
    }

    #[test]
    fn test_first_occurrence_only() {
        let text = "fox one fox two";
        let snippet = build_snippet(text, &words(&["fox"]));

        assert_eq!(snippet, "...<b>fox</b> one fox two");
    }

    #[test]
    fn test_distant_matches_are_split() {
        let filler = "x".repeat(200);
        let text = format!("alpha {} omega", filler);
        let snippet = build_snippet(&text, &words(&["alpha", "omega"]));

        let window = CONTEXT_CHARS / 2;
        let expected = format!(
            "...<b>alpha</b> {}...{} <b>omega</b>",
            &filler[..window - 1],
            &filler[filler.len() - (window - 1)..]
        );
        assert_eq!(snippet, expected);
    }

    #[test]
    fn test_long_tail_is_cut() {
        let text = format!("fox {}", "y".repeat(200));
        let snippet = build_snippet(&text, &words(&["fox"]));

        assert!(snippet.ends_with(ELLIPSIS));
        assert_eq!(
            snippet,
            format!("...<b>fox</b> {}...", "y".repeat(CONTEXT_CHARS - 1))
        );
    }

    #[test]
    fn test_cyrillic_offsets() {
        let text = "Быстрая рыжая лиса прыгает через ленивую собаку";
        let snippet = build_snippet(text, &words(&["лиса"]));

        assert_eq!(
            snippet,
            "...Быстрая рыжая <b>лиса</b> прыгает через ленивую собаку"
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(build_snippet("nothing here", &words(&["fox"])), "");
        assert_eq!(build_snippet("nothing here", &[]), "");
    }

    #[test]
    fn test_window_shared_by_surface_forms() {
        let text = format!("Fox {}", "a".repeat(60));
        let snippet = build_snippet(&text, &words(&["Fox", "fox"]));

        assert_eq!(snippet, format!("...<b>Fox</b> {}...", "a".repeat(39)));
    }
}
