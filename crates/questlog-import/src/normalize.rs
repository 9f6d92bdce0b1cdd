//! Title normalizers used as comparison keys by every matching step.
//!
//! Two distinct transforms, kept separate on purpose: dedup needs
//! article/punctuation insensitivity ("The Witcher 3" vs "Witcher 3 -"),
//! while catalog-title comparison needs trademark/symbol stripping
//! ("DOOM™" vs "DOOM"). Conflating them causes false negatives.

use std::sync::OnceLock;

use regex::Regex;

/// Normalizes a title into the dedup/merge comparison key.
///
/// Lowercases, strips colons and hyphens, removes the standalone word "the",
/// collapses whitespace, and trims. Total: never fails, never panics past
/// the first call.
#[must_use]
pub fn normalize_for_matching(title: &str) -> String {
    static THE_WORD: OnceLock<Regex> = OnceLock::new();
    let the_word = THE_WORD.get_or_init(|| Regex::new(r"\bthe\b").expect("static pattern"));

    let lowered = title.to_lowercase();
    let depunctuated: String = lowered.chars().filter(|c| !matches!(c, ':' | '-')).collect();
    let without_article = the_word.replace_all(&depunctuated, "");
    without_article
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strips trademark/copyright/currency/ellipsis symbols and lowercases, for
/// comparisons against catalog titles.
#[must_use]
pub fn strip_symbols(title: &str) -> String {
    const SYMBOLS: [char; 9] = [
        '\u{2122}', // ™
        '\u{00A9}', // ©
        '\u{00AE}', // ®
        '\u{0024}', // $
        '\u{20AC}', // €
        '\u{00A3}', // £
        '\u{00A5}', // ¥
        '\u{2022}', // •
        '\u{2026}', // …
    ];
    title
        .chars()
        .filter(|c| !SYMBOLS.contains(c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(
            normalize_for_matching("The Legend of Zelda: Breath of the Wild"),
            "legend of zelda breath of wild"
        );
    }

    #[test]
    fn removes_standalone_the_but_not_embedded() {
        assert_eq!(normalize_for_matching("The Thing"), "thing");
        // "thequel" keeps its leading "the" because it is not a standalone word.
        assert_eq!(normalize_for_matching("Thequel"), "thequel");
    }

    #[test]
    fn strips_hyphens_without_joining_words() {
        assert_eq!(
            normalize_for_matching("Counter-Strike 2"),
            "counterstrike 2"
        );
        assert_eq!(normalize_for_matching("Counter Strike 2"), "counter strike 2");
    }

    #[test]
    fn collapses_runs_of_whitespace() {
        assert_eq!(normalize_for_matching("  Outer   Wilds  "), "outer wilds");
    }

    #[test]
    fn is_idempotent() {
        let once = normalize_for_matching("The Witcher 3: Wild Hunt");
        assert_eq!(normalize_for_matching(&once), once);
    }

    #[test]
    fn strip_symbols_removes_marks_and_lowercases() {
        assert_eq!(strip_symbols("DOOM\u{2122}"), "doom");
        assert_eq!(strip_symbols("Sid Meier\u{2019}s…"), "sid meier\u{2019}s");
        assert_eq!(strip_symbols("PAC-MAN\u{00AE}"), "pac-man");
    }

    #[test]
    fn strip_symbols_keeps_punctuation_the_matcher_key_drops() {
        // Hyphens survive here; only the symbol set is stripped.
        assert_eq!(strip_symbols("Counter-Strike 2"), "counter-strike 2");
    }
}
