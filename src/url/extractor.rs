//! URL extraction from raw message content

use once_cell::sync::Lazy;
use regex::Regex;

static URL_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+").expect("static pattern is valid"));

/// Finds candidate URLs: maximal non-whitespace runs starting with `http`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlExtractor;

impl UrlExtractor {
    pub fn new() -> Self {
        Self
    }

    /// URLs in order of appearance. Duplicates are kept.
    pub fn extract<'a>(&self, content: &'a str) -> Vec<&'a str> {
        URL_RUN.find_iter(content).map(|m| m.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_order_and_duplicates() {
        let urls = UrlExtractor::new().extract(
            "see http://a.example.com then https://b.example.org/x?y=1 and http://a.example.com",
        );
        assert_eq!(
            urls,
            vec![
                "http://a.example.com",
                "https://b.example.org/x?y=1",
                "http://a.example.com"
            ]
        );
    }

    #[test]
    fn test_no_urls() {
        assert!(UrlExtractor::new().extract("hello there, no links").is_empty());
        assert!(UrlExtractor::new().extract("").is_empty());
        // A bare scheme word needs at least one more character.
        assert!(UrlExtractor::new().extract("http ").is_empty());
    }

    #[test]
    fn test_run_includes_trailing_punctuation() {
        let urls = UrlExtractor::new().extract("click (http://x.co/login), now");
        assert_eq!(urls, vec!["http://x.co/login),"]);
    }

    #[test]
    fn test_mid_word_match() {
        let urls = UrlExtractor::new().extract("visit:http://x.co");
        assert_eq!(urls, vec!["http://x.co"]);
    }
}
