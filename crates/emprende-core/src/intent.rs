//! # Intent Parser
//!
//! Turns a loosely structured Spanish utterance into a [`ParsedIntent`].
//!
//! ## Rule Priority (first match wins)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  utterance                                                              │
//! │     │  lowercase + trim + number words → digits                         │
//! │     ▼                                                                   │
//! │  1. "nuevo/crear/agregar producto" ──► INVENTORY_ADD {product,price,    │
//! │                                                       stock}            │
//! │  2. "reponer/llegaron/sumar stock/agregar a" + N ──► INVENTORY_RESTOCK  │
//! │  3. "vendí/venta/ingreso/gané…"                                         │
//! │       ├── list separator (" y ", " e ", ",") ──► MULTI_SALE {items}     │
//! │       └── single amount ──────────────────────► SALE {amount, product,  │
//! │                                                       isQuantity}       │
//! │  4. "gasté/compré/pagué…" + N ──────────────────► EXPENSE               │
//! │  5. anything else ──────────────────────────────► UNKNOWN {original}    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quantity or Cash?
//! A bare number can't say whether "vendí 3" means three units or three
//! pesos. The parser treats amounts below [`QUANTITY_THRESHOLD`] as unit
//! counts and anything at or above it as money. This is a heuristic, not
//! a rule of the domain; [`IntentParser::with_quantity_threshold`] lets a
//! caller tune it.
//!
//! The parser never fails: anything it can't classify becomes
//! [`ParsedIntent::Unknown`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::normalize::word_numerals_to_digits;

/// Amounts strictly below this are unit counts; the rest are pesos.
pub const QUANTITY_THRESHOLD: i64 = 1000;

/// Product label for cash sales with no product phrase.
pub const GENERAL_SALE_LABEL: &str = "Venta General";

/// Description for expenses with no description phrase.
pub const GENERAL_EXPENSE_LABEL: &str = "Gasto General";

// =============================================================================
// Parsed Intent
// =============================================================================

/// One line of a multi-item sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleLine {
    pub amount: i64,
    pub product: String,
    pub is_quantity: bool,
}

/// The structured command behind an utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ParsedIntent {
    Sale {
        amount: i64,
        product: Option<String>,
        #[serde(rename = "isQuantity")]
        is_quantity: bool,
    },
    MultiSale {
        items: Vec<SaleLine>,
    },
    Expense {
        amount: i64,
        description: Option<String>,
    },
    InventoryAdd {
        product: String,
        price: Option<i64>,
        stock: Option<i64>,
    },
    /// `amount` is the number of units arriving.
    InventoryRestock {
        amount: i64,
        product: String,
    },
    Unknown {
        original: String,
    },
}

// =============================================================================
// Patterns
// =============================================================================

static CREATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:nuevo|crear|agregar)\s+producto\b").unwrap());

static STOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:con|stock)\s+(\d+)(?:\s*(?:unidades|unidad|u)\b\.?)?").unwrap()
});

static RESTOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:reponer|llegaron|sumar stock|agregar a)\b").unwrap());

static SALE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:vend(?:ieron|imos|emos|iste|i[óo]|er|[íi]|o|e)|ventas?|ingres(?:os?|[óo]|[ée])|gan(?:amos|aste|[ée]|[óo]))\b",
    )
    .unwrap()
});

static EXPENSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:gast(?:amos|os?|[ée]|[óo])|compr(?:amos|as?|[ée]|[óo])|pag(?:u[ée]|amos|[óo]))\b",
    )
    .unwrap()
});

/// A comma only separates items when a space follows it, so "5,000" stays one number.
static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*,\s+|\s+(?:y|e)\s+").unwrap());

/// First number, allowing "$" and dot/comma/space thousand groups: "$ 5.000",
/// "5,000", "12 500".
static AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\s?\d+(?:[.,\s]\d{3})*").unwrap());

static LEADING_PREPOSITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:de|en|por)(?:\s+|$)").unwrap());

static TRAILING_CONNECTOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+(?:a|de|en|por|con)$").unwrap());

static CURRENCY_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bpesos?\b").unwrap());

static LEADING_UNITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^unidad(?:es)?(?:\s+|$)").unwrap());

static TRAILING_UNITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\bunidades?$").unwrap());

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// =============================================================================
// Parser
// =============================================================================

/// Utterance classifier with a tunable quantity/cash boundary.
#[derive(Debug, Clone, Copy)]
pub struct IntentParser {
    quantity_threshold: i64,
}

impl Default for IntentParser {
    fn default() -> Self {
        IntentParser {
            quantity_threshold: QUANTITY_THRESHOLD,
        }
    }
}

impl IntentParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the boundary below which an amount counts as units.
    pub fn with_quantity_threshold(mut self, threshold: i64) -> Self {
        self.quantity_threshold = threshold;
        self
    }

    pub fn quantity_threshold(&self) -> i64 {
        self.quantity_threshold
    }

    fn is_quantity(&self, amount: i64) -> bool {
        amount < self.quantity_threshold
    }

    /// Classifies an utterance. Never fails.
    ///
    /// ## Example
    /// ```rust
    /// use emprende_core::intent::IntentParser;
    /// use emprende_core::ParsedIntent;
    ///
    /// let parser = IntentParser::new();
    /// assert_eq!(
    ///     parser.parse("vendí 3 pulseras"),
    ///     ParsedIntent::Sale {
    ///         amount: 3,
    ///         product: Some("pulseras".to_string()),
    ///         is_quantity: true,
    ///     }
    /// );
    /// ```
    pub fn parse(&self, utterance: &str) -> ParsedIntent {
        let text = word_numerals_to_digits(&utterance.trim().to_lowercase());

        if let Some(intent) = parse_inventory_add(&text) {
            return intent;
        }

        if let Some(intent) = parse_restock(&text) {
            return intent;
        }

        if let Some(intent) = self.parse_sale(&text) {
            return intent;
        }

        if let Some(intent) = parse_expense(&text) {
            return intent;
        }

        ParsedIntent::Unknown {
            original: utterance.to_string(),
        }
    }

    fn parse_sale(&self, text: &str) -> Option<ParsedIntent> {
        if !SALE_RE.is_match(text) {
            return None;
        }

        let content = collapse(&SALE_RE.replacen(text, 1, ""));

        if SEPARATOR_RE.is_match(&content) {
            let items = self.parse_sale_segments(&content);
            if !items.is_empty() {
                return Some(ParsedIntent::MultiSale { items });
            }
        }

        let (amount, rest) = extract_amount(&content)?;
        let product = clean_description(&rest);
        let is_quantity = self.is_quantity(amount);

        let product = if !product.is_empty() {
            Some(product)
        } else if is_quantity {
            None
        } else {
            Some(GENERAL_SALE_LABEL.to_string())
        };

        Some(ParsedIntent::Sale {
            amount,
            product,
            is_quantity,
        })
    }

    fn parse_sale_segments(&self, content: &str) -> Vec<SaleLine> {
        SEPARATOR_RE
            .split(content)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .filter_map(|segment| match extract_amount(segment) {
                Some((amount, rest)) => Some(SaleLine {
                    amount,
                    product: clean_description(&rest),
                    is_quantity: self.is_quantity(amount),
                }),
                // "pan y bebida": an unnumbered item means one unit
                None => {
                    let product = clean_description(segment);
                    (!product.is_empty()).then(|| SaleLine {
                        amount: 1,
                        product,
                        is_quantity: true,
                    })
                }
            })
            .collect()
    }
}

/// Classifies an utterance with the default quantity threshold.
pub fn parse(utterance: &str) -> ParsedIntent {
    IntentParser::default().parse(utterance)
}

// =============================================================================
// Rules
// =============================================================================

fn parse_inventory_add(text: &str) -> Option<ParsedIntent> {
    if !CREATE_RE.is_match(text) {
        return None;
    }

    // "con 50 unidades" is stock, not price: pull it out before pricing
    let (stock, without_stock) = match STOCK_RE.captures(text) {
        Some(caps) => {
            let stock = caps[1].parse::<i64>().ok();
            (stock, collapse(&STOCK_RE.replacen(text, 1, "")))
        }
        None => (None, text.to_string()),
    };

    let (price, rest) = match extract_amount(&without_stock) {
        Some((amount, rest)) => (Some(amount), rest),
        None => (None, without_stock),
    };

    let product = clean_description(&CREATE_RE.replacen(&rest, 1, ""));
    if product.is_empty() {
        return None;
    }

    Some(ParsedIntent::InventoryAdd {
        product,
        price,
        stock: Some(stock.unwrap_or(0)),
    })
}

fn parse_restock(text: &str) -> Option<ParsedIntent> {
    if !RESTOCK_RE.is_match(text) {
        return None;
    }

    let (amount, rest) = extract_amount(text)?;
    let product = clean_description(&RESTOCK_RE.replacen(&rest, 1, ""));
    if product.is_empty() {
        return None;
    }

    Some(ParsedIntent::InventoryRestock { amount, product })
}

fn parse_expense(text: &str) -> Option<ParsedIntent> {
    if !EXPENSE_RE.is_match(text) {
        return None;
    }

    let (amount, rest) = extract_amount(text)?;
    let description = clean_description(&EXPENSE_RE.replacen(&rest, 1, ""));

    Some(ParsedIntent::Expense {
        amount,
        description: Some(if description.is_empty() {
            GENERAL_EXPENSE_LABEL.to_string()
        } else {
            description
        }),
    })
}

// =============================================================================
// Fragment Helpers
// =============================================================================

/// Finds the first number and returns it with the text that surrounds it.
///
/// Thousand separators ("." or a space before a 3-digit group) and a
/// leading "$" are dropped before parsing. Numbers too large for `i64`
/// count as no number.
pub fn extract_amount(text: &str) -> Option<(i64, String)> {
    let found = AMOUNT_RE.find(text)?;
    let digits: String = found
        .as_str()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    let amount = digits.parse::<i64>().ok()?;

    let mut rest = String::with_capacity(text.len());
    rest.push_str(&text[..found.start()]);
    rest.push(' ');
    rest.push_str(&text[found.end()..]);

    Some((amount, collapse(&rest)))
}

/// Strips leading prepositions, currency words and unit words.
///
/// Repeats until stable, so "de en taxi" ends as "taxi" and "de pesos"
/// ends empty.
pub fn clean_description(fragment: &str) -> String {
    let mut current = collapse(fragment);

    loop {
        let mut next = LEADING_PREPOSITION_RE.replace(&current, "").into_owned();
        next = LEADING_UNITS_RE.replace(&next, "").into_owned();
        next = collapse(&CURRENCY_WORD_RE.replace_all(&next, ""));
        next = TRAILING_UNITS_RE.replace(&next, "").trim().to_string();
        next = TRAILING_CONNECTOR_RE.replace(&next, "").trim().to_string();

        if next == current {
            return next;
        }
        current = next;
    }
}

fn collapse(s: &str) -> String {
    WHITESPACE_RE.replace_all(s.trim(), " ").into_owned()
}

// =============================================================================
// Unit Tests
// =============================================================================
