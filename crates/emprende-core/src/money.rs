//! # Money Module
//!
//! Provides the `Money` type for handling peso amounts.
//!
//! ## Whole Pesos, Integer Math
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Chilean pesos have no minor unit in everyday retail.                   │
//! │                                                                         │
//! │  Product.price (i64) ──► × quantity ──► Transaction.amount (i64)        │
//! │                                                                         │
//! │  No floats anywhere: price × quantity is exact, or it is rejected.     │
//! │  Display follows es-CL: 1234567 → "$1.234.567"                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use emprende_core::money::Money;
//!
//! let price = Money::from_pesos(2500);
//! let line = price.checked_multiply_quantity(3).unwrap();
//! assert_eq!(line.pesos(), 7500);
//! assert_eq!(line.to_string(), "$7.500");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole pesos.
///
/// ## Design Decisions
/// - **i64 (signed)**: expense balances and losses can go negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole pesos.
    #[inline]
    pub const fn from_pesos(pesos: i64) -> Self {
        Money(pesos)
    }

    /// Returns the value in whole pesos.
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies a unit price by a quantity. `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use emprende_core::money::Money;
    ///
    /// assert_eq!(Money::from_pesos(1000).checked_multiply_quantity(3), Some(Money::from_pesos(3000)));
    /// assert_eq!(Money::from_pesos(i64::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, quantity: i64) -> Option<Self> {
        match self.0.checked_mul(quantity) {
            Some(pesos) => Some(Money(pesos)),
            None => None,
        }
    }

    /// Adds two amounts. `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, rhs: Money) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(pesos) => Some(Money(pesos)),
            None => None,
        }
    }
}

/// Groups the digits of `value` with dots, es-CL style, without the symbol.
///
/// ## Example
/// ```rust
/// use emprende_core::money::format_thousands;
///
/// assert_eq!(format_thousands(5000), "5.000");
/// assert_eq!(format_thousands(-1234567), "-1.234.567");
/// assert_eq!(format_thousands(999), "999");
/// ```
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "-${}", format_thousands(self.0).trim_start_matches('-'))
        } else {
            write!(f, "${}", format_thousands(self.0))
        }
    }
}

impl From<i64> for Money {
    fn from(pesos: i64) -> Self {
        Money(pesos)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
