//! Porter suffix stemmer, NLTK flavour.
//!
//! Follows the published algorithm plus the NLTK extensions the text model's
//! vocabulary was built with: an irregular-form pool, the four-letter
//! `ies`/`ied` rules, `alli` handled ahead of step 2, the extra `fulli` and
//! `logi` rules, a two-letter `*o` condition and no stemming of words of two
//! characters or fewer.
//!
//! Input is expected to be lowercase ASCII letters. Anything else is returned
//! lowercased but otherwise untouched.

/// Stateless Porter stemmer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

impl PorterStemmer {
    pub fn new() -> Self {
        Self
    }

    /// Reduce a single word to its stem.
    pub fn stem(&self, word: &str) -> String {
        let word = word.to_lowercase();

        if let Some(irregular) = irregular_form(&word) {
            return irregular.to_string();
        }
        if word.len() <= 2 || !word.bytes().all(|b| b.is_ascii_lowercase()) {
            return word;
        }

        let word = step1a(word);
        let word = step1b(word);
        let word = step1c(word);
        let word = step2(word);
        let word = step3(word);
        let word = step4(word);
        let word = step5a(word);
        step5b(word)
    }
}

fn irregular_form(word: &str) -> Option<&'static str> {
    let stem = match word {
        "sky" | "skies" => "sky",
        "dying" => "die",
        "lying" => "lie",
        "tying" => "tie",
        "news" => "news",
        "innings" | "inning" => "inning",
        "outings" | "outing" => "outing",
        "cannings" | "canning" => "canning",
        "howe" => "howe",
        "proceed" => "proceed",
        "exceed" => "exceed",
        "succeed" => "succeed",
        _ => return None,
    };
    Some(stem)
}

fn is_consonant(word: &[u8], i: usize) -> bool {
    match word[i] {
        b'a' | b'e' | b'i' | b'o' | b'u' => false,
        b'y' => i == 0 || !is_consonant(word, i - 1),
        _ => true,
    }
}

/// Number of vowel-consonant sequences, the `m` of `[C](VC){m}[V]`.
fn measure(stem: &str) -> usize {
    let bytes = stem.as_bytes();
    (1..bytes.len())
        .filter(|&i| !is_consonant(bytes, i - 1) && is_consonant(bytes, i))
        .count()
}

fn contains_vowel(stem: &str) -> bool {
    let bytes = stem.as_bytes();
    (0..bytes.len()).any(|i| !is_consonant(bytes, i))
}

fn ends_double_consonant(word: &str) -> bool {
    let bytes = word.as_bytes();
    let n = bytes.len();
    n >= 2 && bytes[n - 1] == bytes[n - 2] && is_consonant(bytes, n - 1)
}

/// `*o`: ends consonant-vowel-consonant with the last not w, x or y.
fn ends_cvc(word: &str) -> bool {
    let bytes = word.as_bytes();
    let n = bytes.len();
    (n >= 3
        && is_consonant(bytes, n - 3)
        && !is_consonant(bytes, n - 2)
        && is_consonant(bytes, n - 1)
        && !matches!(bytes[n - 1], b'w' | b'x' | b'y'))
        || (n == 2 && !is_consonant(bytes, 0) && is_consonant(bytes, 1))
}

fn strip<'a>(word: &'a str, suffix: &str) -> &'a str {
    &word[..word.len() - suffix.len()]
}

/// Apply the first rule whose suffix matches. If its condition fails the
/// word is returned unchanged and later rules are not tried.
fn apply_rules<F>(word: String, rules: &[(&str, &str)], condition: F) -> String
where
    F: Fn(&str, &str) -> bool,
{
    for &(suffix, replacement) in rules {
        if word.ends_with(suffix) {
            let stem = strip(&word, suffix);
            if condition(stem, suffix) {
                return format!("{}{}", stem, replacement);
            }
            return word;
        }
    }
    word
}

fn step1a(word: String) -> String {
    if word.len() == 4 && word.ends_with("ies") {
        return format!("{}ie", strip(&word, "ies"));
    }
    apply_rules(
        word,
        &[("sses", "ss"), ("ies", "i"), ("ss", "ss"), ("s", "")],
        |_, _| true,
    )
}

fn step1b(word: String) -> String {
    if word.ends_with("ied") {
        let replacement = if word.len() == 4 { "ie" } else { "i" };
        return format!("{}{}", strip(&word, "ied"), replacement);
    }

    if word.ends_with("eed") {
        let stem = strip(&word, "eed");
        if measure(stem) > 0 {
            return format!("{}ee", stem);
        }
        return word;
    }

    let intermediate = ["ed", "ing"]
        .iter()
        .filter(|suffix| word.ends_with(*suffix))
        .map(|suffix| strip(&word, suffix))
        .find(|stem| contains_vowel(stem));

    let Some(stem) = intermediate else {
        return word;
    };

    if stem.ends_with("at") || stem.ends_with("bl") || stem.ends_with("iz") {
        return format!("{}e", stem);
    }
    if ends_double_consonant(stem) {
        return if stem.ends_with(['l', 's', 'z']) {
            stem.to_string()
        } else {
            stem[..stem.len() - 1].to_string()
        };
    }
    if measure(stem) == 1 && ends_cvc(stem) {
        return format!("{}e", stem);
    }
    stem.to_string()
}

fn step1c(word: String) -> String {
    apply_rules(word, &[("y", "i")], |stem, _| {
        let bytes = stem.as_bytes();
        bytes.len() > 1 && is_consonant(bytes, bytes.len() - 1)
    })
}

const STEP2_RULES: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("bli", "ble"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
    ("fulli", "ful"),
    ("logi", "log"),
];

fn step2(word: String) -> String {
    if word.ends_with("alli") && measure(strip(&word, "alli")) > 0 {
        return step2(format!("{}al", strip(&word, "alli")));
    }

    // `logi` keeps its `l` with the stem for the measure check.
    let with_l = word.len().saturating_sub(3);
    let logi_stem = word[..with_l].to_string();
    apply_rules(word, STEP2_RULES, |stem, suffix| {
        if suffix == "logi" {
            measure(&logi_stem) > 0
        } else {
            measure(stem) > 0
        }
    })
}

fn step3(word: String) -> String {
    apply_rules(
        word,
        &[
            ("icate", "ic"),
            ("ative", ""),
            ("alize", "al"),
            ("iciti", "ic"),
            ("ical", "ic"),
            ("ful", ""),
            ("ness", ""),
        ],
        |stem, _| measure(stem) > 0,
    )
}

const STEP4_SUFFIXES: &[(&str, &str)] = &[
    ("al", ""),
    ("ance", ""),
    ("ence", ""),
    ("er", ""),
    ("ic", ""),
    ("able", ""),
    ("ible", ""),
    ("ant", ""),
    ("ement", ""),
    ("ment", ""),
    ("ent", ""),
    ("ion", ""),
    ("ou", ""),
    ("ism", ""),
    ("ate", ""),
    ("iti", ""),
    ("ous", ""),
    ("ive", ""),
    ("ize", ""),
];

fn step4(word: String) -> String {
    apply_rules(word, STEP4_SUFFIXES, |stem, suffix| {
        measure(stem) > 1 && (suffix != "ion" || stem.ends_with(['s', 't']))
    })
}

fn step5a(word: String) -> String {
    if let Some(stem) = word.strip_suffix('e') {
        let m = measure(stem);
        if m > 1 || (m == 1 && !ends_cvc(stem)) {
            return stem.to_string();
        }
    }
    word
}

fn step5b(word: String) -> String {
    if word.ends_with("ll") && measure(&word[..word.len() - 1]) > 1 {
        return word[..word.len() - 1].to_string();
    }
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stem(word: &str) -> String {
        PorterStemmer::new().stem(word)
    }

    #[test]
    fn test_common_suffixes() {
        assert_eq!(stem("running"), "run");
        assert_eq!(stem("caresses"), "caress");
        assert_eq!(stem("meeting"), "meet");
        assert_eq!(stem("happiness"), "happi");
        assert_eq!(stem("generously"), "gener");
        assert_eq!(stem("agreed"), "agre");
        assert_eq!(stem("congratulations"), "congratul");
    }

    #[test]
    fn test_nltk_extensions() {
        assert_eq!(stem("flies"), "fli");
        assert_eq!(stem("dies"), "die");
        assert_eq!(stem("lying"), "lie");
        assert_eq!(stem("skies"), "sky");
        assert_eq!(stem("news"), "news");
    }

    #[test]
    fn test_short_words_untouched() {
        assert_eq!(stem("is"), "is");
        assert_eq!(stem("as"), "as");
        assert_eq!(stem("a"), "a");
    }

    #[test]
    fn test_measure() {
        assert_eq!(measure("tr"), 0);
        assert_eq!(measure("tree"), 0);
        assert_eq!(measure("trouble"), 1);
        assert_eq!(measure("oats"), 1);
        assert_eq!(measure("troubles"), 2);
        assert_eq!(measure("private"), 2);
    }

    #[test]
    fn test_non_ascii_passthrough() {
        assert_eq!(stem("Café"), "café");
    }
}
