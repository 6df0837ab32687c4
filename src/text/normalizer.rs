//! Message text normalization for the text model.
//!
//! Reproduces the preprocessing applied to the training corpus, step for
//! step, so inference sees the same vocabulary the vectorizer was fitted on.

use super::porter::PorterStemmer;
use super::stopwords;
use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALPHA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z\s]").expect("static pattern is valid"));
static URL_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+").expect("static pattern is valid"));

/// Whole-word forms the word tokenizer splits in two. Only the rules that
/// survive the letter scrub are listed.
const CONTRACTIONS: [(&str, &str, &str); 6] = [
    ("cannot", "can", "not"),
    ("gimme", "gim", "me"),
    ("gonna", "gon", "na"),
    ("gotta", "got", "ta"),
    ("lemme", "lem", "me"),
    ("wanna", "wan", "na"),
];

/// Split scrubbed text into word tokens.
fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace().flat_map(|token| {
        let (head, tail) = match CONTRACTIONS.iter().find(|(word, _, _)| *word == token) {
            Some((_, head, tail)) => (*head, Some(*tail)),
            None => (token, None),
        };
        std::iter::once(head).chain(tail)
    })
}

/// Turns raw chat text into the space-joined stem string the text model expects.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    stemmer: PorterStemmer,
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self {
            stemmer: PorterStemmer::new(),
        }
    }

    /// Normalize raw content. The scrub of non-letters runs before URL
    /// removal, so a link survives as one `http...` letter run and is then
    /// dropped whole.
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let letters = NON_ALPHA.replace_all(&lowered, "");
        let without_urls = URL_RUN.replace_all(&letters, "");

        tokenize(&without_urls)
            .filter(|token| !stopwords::is_stopword(token))
            .map(|token| self.stemmer.stem(token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scam_message() {
        let normalizer = TextNormalizer::new();
        let out = normalizer.normalize(
            "Congratulations! You have WON a free prize, claim now at http://win.example.com",
        );
        assert_eq!(out, "congratul free prize claim");
    }

    #[test]
    fn test_empty_and_stopwords_only() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize(""), "");
        assert_eq!(normalizer.normalize("the and of 123 !!!"), "");
    }

    #[test]
    fn test_url_removed_after_scrub() {
        let normalizer = TextNormalizer::new();
        // The dots and slashes go first, leaving one run that is then removed.
        assert_eq!(
            normalizer.normalize("meeting https://secure-login.example.com/verify tomorrow"),
            "meet tomorrow"
        );
    }

    #[test]
    fn test_non_ascii_letters_dropped() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize("prize\u{00e9}s caf\u{00e9}"), "prize caf");
    }

    #[test]
    fn test_fixed_point() {
        let normalizer = TextNormalizer::new();
        let once = normalizer.normalize("congratul free prize claim");
        assert_eq!(once, "congratul free prize claim");
        assert_eq!(normalizer.normalize(&once), once);
    }

    #[test]
    fn test_contractions_split_before_stopwords() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize("i cannot pay"), "pay");
        assert_eq!(normalizer.normalize("you gonna win"), "gon na win");
        assert_eq!(normalizer.normalize("Wanna claim"), "wan na claim");
        assert_eq!(normalizer.normalize("gotta go"), "got ta go");
        // The trailing halves of these are stopwords.
        assert_eq!(normalizer.normalize("gimme prize lemme"), "gim prize lem");
    }

    #[test]
    fn test_only_whole_words_split() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize("wannabe gonnas"), "wannab gonna");
    }

    #[test]
    fn test_stemming_is_not_always_idempotent() {
        let normalizer = TextNormalizer::new();
        let once = normalizer.normalize("we agreed yesterday");
        assert_eq!(once, "agre yesterday");
        assert_eq!(normalizer.normalize(&once), "agr yesterday");
    }

    proptest! {
        #[test]
        fn output_is_lowercase_ascii(text in "\\PC{0,80}") {
            let out = TextNormalizer::new().normalize(&text);
            prop_assert!(out.chars().all(|c| c.is_ascii_lowercase() || c == ' '));
            prop_assert!(!out.contains("  "));
            prop_assert!(!out.starts_with(' ') && !out.ends_with(' '));
        }

        #[test]
        fn url_runs_are_cut(words in proptest::collection::vec("[a-z]{1,8}", 0..12)) {
            let out = TextNormalizer::new().normalize(&words.join(" "));
            for token in out.split(' ').filter(|t| !t.is_empty()) {
                // Anything after an `http` inside a token is removed.
                prop_assert!(token.find("http").map_or(true, |i| i + 4 == token.len()));
            }
        }
    }
}
