//! # Text Normalizer
//!
//! Folds spoken or typed text into a comparable form.
//!
//! ```text
//!   "  Pulséras "  ──normalize──►  "pulseras"
//!   "vendí dos panes" ──word_numerals_to_digits──► "vendí 2 panes"
//!   "gasté cinco mil" ──word_numerals_to_digits──► "gasté 5000"
//! ```
//!
//! Both functions are pure and deterministic.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Spanish number words understood by the parser.
const NUMBER_WORDS: &[(&str, i64)] = &[
    ("un", 1),
    ("uno", 1),
    ("una", 1),
    ("dos", 2),
    ("tres", 3),
    ("cuatro", 4),
    ("cinco", 5),
    ("seis", 6),
    ("siete", 7),
    ("ocho", 8),
    ("nueve", 9),
    ("diez", 10),
    ("once", 11),
    ("doce", 12),
    ("quince", 15),
    ("veinte", 20),
    ("treinta", 30),
    ("cincuenta", 50),
    ("cien", 100),
];

static NUMBER_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    let alternation = NUMBER_WORDS
        .iter()
        .map(|(word, _)| *word)
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).unwrap()
});

/// "5 mil" → 5000. Runs after the small words became digits.
static THOUSANDS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(\d+)\s+mil\b").unwrap());

static BARE_MIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bmil\b").unwrap());

/// Lowercases, trims and strips diacritics.
///
/// ## Example
/// ```rust
/// use emprende_core::normalize::normalize;
///
/// assert_eq!(normalize("Pulséras"), normalize("pulseras"));
/// assert_eq!(normalize("  CAFÉ con Leche "), "cafe con leche");
/// ```
pub fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Replaces whole-word Spanish number terms with digits.
///
/// Only whole words are touched: "todos" keeps its "dos", "unidad" keeps
/// its "un". A number followed by "mil" is multiplied out ("dos mil" →
/// "2000"); a bare "mil" becomes "1000".
///
/// ## Example
/// ```rust
/// use emprende_core::normalize::word_numerals_to_digits;
///
/// assert_eq!(word_numerals_to_digits("vendí tres pulseras"), "vendí 3 pulseras");
/// assert_eq!(word_numerals_to_digits("todos los panes"), "todos los panes");
/// ```
pub fn word_numerals_to_digits(s: &str) -> String {
    let replaced = NUMBER_WORD_RE.replace_all(s, |caps: &Captures<'_>| {
        let word = caps[0].to_lowercase();
        NUMBER_WORDS
            .iter()
            .find(|(w, _)| *w == word)
            .map(|(_, n)| n.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    });

    let multiplied = THOUSANDS_RE.replace_all(&replaced, |caps: &Captures<'_>| {
        caps[1]
            .parse::<i64>()
            .ok()
            .and_then(|n| n.checked_mul(1000))
            .map(|n| n.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    });

    BARE_MIL_RE.replace_all(&multiplied, "1000").into_owned()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_case_and_accents() {
        assert_eq!(normalize("Pulséras"), normalize("pulseras"));
        assert_eq!(normalize("ÑANDÚ"), "nandu");
        assert_eq!(normalize("  Pan  "), "pan");
    }

    #[test]
    fn test_small_number_words() {
        assert_eq!(word_numerals_to_digits("dos panes y una bebida"), "2 panes y 1 bebida");
        assert_eq!(word_numerals_to_digits("Doce huevos"), "12 huevos");
        assert_eq!(word_numerals_to_digits("cien"), "100");
    }

    #[test]
    fn test_word_boundaries_are_respected() {
        assert_eq!(word_numerals_to_digits("todos unidos"), "todos unidos");
        assert_eq!(word_numerals_to_digits("doscientos"), "doscientos");
        assert_eq!(word_numerals_to_digits("milanesa"), "milanesa");
    }

    #[test]
    fn test_thousands() {
        assert_eq!(word_numerals_to_digits("gasté cinco mil en pan"), "gasté 5000 en pan");
        assert_eq!(word_numerals_to_digits("venta de mil"), "venta de 1000");
        assert_eq!(word_numerals_to_digits("3 mil"), "3000");
    }
}
