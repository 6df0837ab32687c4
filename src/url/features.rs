//! URL feature extraction for the URL model.
//!
//! Produces the four features the URL classifier was trained on, in the
//! exact column order of the training frame.

use serde::{Deserialize, Serialize};

/// Keywords whose presence marks a URL as suspicious (case-insensitive).
pub const SUSPICIOUS_WORDS: [&str; 4] = ["login", "verify", "account", "secure"];

/// Column names in trained order.
pub const FEATURE_NAMES: [&str; 4] = ["length", "num_subdomains", "has_https", "has_suspicious_words"];

/// Fixed-schema feature record for one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlFeatures {
    /// Character count of the URL
    pub length: u64,
    /// Dot count, less one for the scheme-prefixed form. Can be -1.
    pub num_subdomains: i64,
    pub has_https: bool,
    pub has_suspicious_words: bool,
}

impl UrlFeatures {
    /// Row in trained column order, booleans as 0/1.
    pub fn to_f32_row(&self) -> [f32; 4] {
        [
            self.length as f32,
            self.num_subdomains as f32,
            bool_flag(self.has_https) as f32,
            bool_flag(self.has_suspicious_words) as f32,
        ]
    }

    pub fn to_i64_row(&self) -> [i64; 4] {
        [
            self.length as i64,
            self.num_subdomains,
            bool_flag(self.has_https),
            bool_flag(self.has_suspicious_words),
        ]
    }
}

fn bool_flag(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// Converts URL strings into [`UrlFeatures`].
pub struct UrlFeaturizer;

impl UrlFeaturizer {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, url: &str) -> UrlFeatures {
        let dots = url.matches('.').count() as i64;
        let num_subdomains = if url.starts_with("http") { dots - 1 } else { dots };
        let lowered = url.to_lowercase();

        UrlFeatures {
            length: url.chars().count() as u64,
            num_subdomains,
            has_https: lowered.contains("https"),
            has_suspicious_words: SUSPICIOUS_WORDS.iter().any(|word| lowered.contains(word)),
        }
    }

    pub fn feature_count(&self) -> usize {
        FEATURE_NAMES.len()
    }

    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }
}

impl Default for UrlFeaturizer {
    fn default() -> Self {
        Self::new()
    }
}
