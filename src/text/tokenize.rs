use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

fn token_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    // Words of two or more word characters.
    PATTERN
        .get_or_init(|| Regex::new(r"\b\w\w+\b").ok())
        .as_ref()
}

/// Decompose characters and drop everything outside ASCII, so `Köln` becomes `Koln`.
pub fn strip_accents_ascii(text: &str) -> String {
    text.nfkd().filter(char::is_ascii).collect()
}

/// Lowercase, optionally strip accents, and split into word tokens.
pub fn tokenize(text: &str, strip_accents: bool) -> Vec<String> {
    let lowered = text.to_lowercase();
    let normalized = if strip_accents {
        strip_accents_ascii(&lowered)
    } else {
        lowered
    };
    let Some(pattern) = token_pattern() else {
        return Vec::new();
    };
    pattern
        .find_iter(&normalized)
        .map(|token| token.as_str().to_string())
        .collect()
}
