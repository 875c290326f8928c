//! # Product Resolver
//!
//! Maps a spoken product name onto the merchant's catalog.
//!
//! ## Tiered Matching
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  query: "Pulséras"            catalog: [Pulsera, Pulsera Dubai, Pan]    │
//! │     │                                                                   │
//! │     ▼ normalize                                                         │
//! │  "pulseras"                                                             │
//! │     │                                                                   │
//! │  Tier 1: normalized name == query?           ──► no exact match         │
//! │     │                                                                   │
//! │  Tier 2: fold trailing "s" of the last word on both sides               │
//! │          "pulsera"  vs "pulsera" / "pulsera dubai" / "pan"              │
//! │          equal OR either contains the other  ──► Pulsera (first hit)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Matching is order-dependent: the first catalog entry that satisfies a
//! tier wins. There is no scoring.

use crate::normalize::normalize;
use crate::types::Product;

/// Finds the catalog product a free-text name refers to.
///
/// ## Returns
/// * `Some(&Product)` - exact normalized match, else first fuzzy match
/// * `None` - nothing matched, or the query is blank
///
/// ## Example
/// ```rust,ignore
/// let product = resolve("pulseras", &catalog);
/// ```
pub fn resolve<'a>(query: &str, catalog: &'a [Product]) -> Option<&'a Product> {
    let target = normalize(query);
    if target.is_empty() {
        return None;
    }

    if let Some(exact) = catalog.iter().find(|p| normalize(&p.name) == target) {
        return Some(exact);
    }

    let folded_target = fold_plural(&target);

    catalog.iter().find(|p| {
        let folded_name = fold_plural(&normalize(&p.name));
        if folded_name.is_empty() {
            return false;
        }

        folded_name == folded_target
            || folded_name.contains(&folded_target)
            || folded_target.contains(&folded_name)
    })
}

/// Drops one trailing "s" from the last word: "pulseras" → "pulsera".
///
/// Single-letter words are left alone.
pub fn fold_plural(normalized: &str) -> String {
    let trimmed = normalized.trim_end();
    let last_word_len = trimmed
        .rsplit(char::is_whitespace)
        .next()
        .map(str::len)
        .unwrap_or(0);

    match trimmed.strip_suffix('s') {
        Some(stem) if last_word_len > 1 => stem.to_string(),
        _ => trimmed.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, name: &str) -> Product {
        Product {
            id: id.to_string(),
            merchant_id: "m-1".to_string(),
            name: name.to_string(),
            price: 1000,
            cost: 0,
            stock: 10,
            min_stock: 5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_exact_match_beats_earlier_fuzzy_candidate() {
        let catalog = vec![product("1", "Pulsera Dubai"), product("2", "Pulsera")];

        let found = resolve("pulsera", &catalog).unwrap();
        assert_eq!(found.id, "2");
    }

    #[test]
    fn test_exact_match_ignores_case_and_accents() {
        let catalog = vec![product("1", "Café Grano")];
        assert_eq!(resolve("CAFE GRANO", &catalog).unwrap().id, "1");
    }

    #[test]
    fn test_plural_folding() {
        let catalog = vec![product("1", "Pulsera")];
        assert_eq!(resolve("pulseras", &catalog).unwrap().id, "1");

        let catalog = vec![product("1", "Latas")];
        assert_eq!(resolve("lata", &catalog).unwrap().id, "1");
    }

    #[test]
    fn test_containment_both_directions() {
        let catalog = vec![product("1", "Macizo de chocolate")];
        assert_eq!(resolve("macizos", &catalog).unwrap().id, "1");

        let catalog = vec![product("1", "Dubai")];
        assert_eq!(resolve("dubai grande", &catalog).unwrap().id, "1");
    }

    #[test]
    fn test_first_fuzzy_match_wins() {
        let catalog = vec![product("1", "Pan amasado"), product("2", "Pan integral")];
        assert_eq!(resolve("pan", &catalog).unwrap().id, "1");
    }

    #[test]
    fn test_no_match() {
        let catalog = vec![product("1", "Pulsera")];
        assert!(resolve("alfajor", &catalog).is_none());
        assert!(resolve("   ", &catalog).is_none());
        assert!(resolve("pulsera", &[]).is_none());
    }

    #[test]
    fn test_fold_plural_only_touches_last_word() {
        assert_eq!(fold_plural("pulseras"), "pulsera");
        assert_eq!(fold_plural("latas grandes"), "latas grande");
        assert_eq!(fold_plural("pan"), "pan");
        assert_eq!(fold_plural("s"), "s");
    }
}
