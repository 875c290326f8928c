//! # Validation Module
//!
//! Input checks shared by the executor, the product editor and the POS cart.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Intent parser                                                │
//! │  └── Shape only: numbers, product text, rule order                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business rules: names, prices, quantities, cart limits            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                        │
//! │  └── NOT NULL / CHECK constraints, conditional stock decrement         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::NewProduct;
use crate::{MAX_AMOUNT, MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest product name accepted.
pub const MAX_PRODUCT_NAME_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_PRODUCT_NAME_LEN`] characters
///
/// ## Example
/// ```rust
/// use emprende_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Pulsera Dubai").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "nombre".to_string(),
        });
    }

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "nombre".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(())
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_local_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: e.to_string(),
        }
    })
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Prices and costs may be zero, never negative, at most [`MAX_AMOUNT`].
pub fn validate_price(field: &str, pesos: i64) -> ValidationResult<()> {
    if pesos < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    at_most(field, pesos, MAX_AMOUNT)
}

pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
        });
    }
    at_most("stock", stock, MAX_QUANTITY)
}

/// Validates a unit count for a sale or restock.
///
/// ## Rules
/// - Must be positive (> 0)
/// - At most [`MAX_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "cantidad".to_string(),
        });
    }
    at_most("cantidad", qty, MAX_QUANTITY)
}

/// Validates a money amount for a cash sale or expense: positive, at most
/// [`MAX_AMOUNT`].
pub fn validate_amount(pesos: i64) -> ValidationResult<()> {
    if pesos <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "monto".to_string(),
        });
    }
    at_most("monto", pesos, MAX_AMOUNT)
}

fn at_most(field: &str, value: i64, max: i64) -> ValidationResult<()> {
    if value > max {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Cart quantities are also capped at [`MAX_ITEM_QUANTITY`].
///
/// ## User Workflow
/// ```text
/// /carrito <id> 5
///      │
///      ▼
/// validate_cart_quantity(5) ← THIS FUNCTION
///      │
///      ├── qty <= 0?   → "El campo cantidad debe ser mayor que cero"
///      ├── qty > 999?  → "La cantidad 1200 supera el máximo permitido (999)"
///      └── OK          → line added / merged
/// ```
pub fn validate_cart_quantity(qty: i64) -> CoreResult<()> {
    validate_quantity(qty)?;

    if qty > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: qty,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Rejects adding one more distinct product to a full cart.
pub fn validate_cart_size(current_items: usize) -> CoreResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        });
    }
    Ok(())
}

pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    validate_price("precio", product.price)?;
    validate_stock(product.stock)?;
    if let Some(cost) = product.cost {
        validate_price("costo", cost)?;
    }
    if let Some(min_stock) = product.min_stock {
        if min_stock < 0 {
            return Err(ValidationError::Negative {
                field: "stock mínimo".to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Macizo de chocolate").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"ñ".repeat(100)).is_ok());
        assert!(validate_product_name(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_QUANTITY).is_ok());
        assert!(matches!(
            validate_quantity(MAX_QUANTITY + 1),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_amount_ceiling() {
        assert!(validate_amount(MAX_AMOUNT).is_ok());
        assert_eq!(
            validate_amount(9_000_000_000_000_000_000),
            Err(ValidationError::TooLarge {
                field: "monto".to_string(),
                max: MAX_AMOUNT,
            })
        );
        assert!(validate_price("precio", MAX_AMOUNT + 1).is_err());
        assert!(validate_new_product(&NewProduct::new("Oro", 9_000_000_000_000_000_000, 5)).is_err());
    }

    #[test]
    fn test_validate_cart_quantity() {
        assert!(validate_cart_quantity(999).is_ok());
        assert_eq!(
            validate_cart_quantity(1000),
            Err(CoreError::QuantityTooLarge {
                requested: 1000,
                max: 999
            })
        );
        assert!(matches!(
            validate_cart_quantity(0),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS).is_err());
    }

    #[test]
    fn test_validate_new_product() {
        assert!(validate_new_product(&NewProduct::new("Pulsera", 1500, 0)).is_ok());
        assert!(validate_new_product(&NewProduct::new("Pulsera", -1, 0)).is_err());
        assert!(validate_new_product(&NewProduct::new("Pulsera", 1500, -2)).is_err());

        let mut with_cost = NewProduct::new("Pulsera", 1500, 3);
        with_cost.cost = Some(-10);
        assert_eq!(
            validate_new_product(&with_cost).unwrap_err().to_string(),
            "El campo costo no puede ser negativo"
        );
    }

    #[test]
    fn test_parse_local_date() {
        let date = parse_local_date("desde", "2024-03-09").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert!(parse_local_date("desde", "09/03/2024").is_err());
    }
}
