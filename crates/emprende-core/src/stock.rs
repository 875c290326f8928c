//! # Stock Validation
//!
//! Everything the executor checks before it is allowed to touch stock.
//!
//! ## Validate, Then Mutate
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Phase 1 (this module, pure)          Phase 2 (executor, storage)       │
//! │  ───────────────────────────          ────────────────────────────      │
//! │  validate_batch / validate_cart  ──►  decrement stock + insert rows     │
//! │     │                                  (one storage transaction)        │
//! │     └── Err(violations) ──► abort, nothing written                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Requests for the same product are summed before comparing against the
//! shelf, so "2 panes y 3 panes" with 4 on hand is rejected up front.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::intent::{SaleLine, GENERAL_SALE_LABEL};
use crate::money::Money;
use crate::resolver::resolve;
use crate::types::{CheckoutLine, NewTransaction, Product};

// =============================================================================
// Violations
// =============================================================================

/// Why a line can't be sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockViolation {
    OutOfStock { product: String },
    Shortage {
        product: String,
        available: i64,
        requested: i64,
    },
    /// Only produced for carts, where lines carry a product id.
    Missing { product: String },
}

impl StockViolation {
    /// Voice-flow wording (zero stock and shortage read differently).
    pub fn into_error(self) -> CoreError {
        match self {
            StockViolation::OutOfStock { product } => CoreError::OutOfStock { product },
            StockViolation::Shortage {
                product,
                available,
                requested,
            } => CoreError::StockShortage {
                product,
                available,
                requested,
            },
            StockViolation::Missing { product } => CoreError::CartProductMissing { name: product },
        }
    }

    /// POS-flow wording.
    pub fn into_cart_error(self) -> CoreError {
        match self {
            StockViolation::OutOfStock { product } => CoreError::CartStockShortage {
                name: product,
                available: 0,
            },
            StockViolation::Shortage {
                product, available, ..
            } => CoreError::CartStockShortage {
                name: product,
                available,
            },
            StockViolation::Missing { product } => CoreError::CartProductMissing { name: product },
        }
    }
}

fn violation_for(product: &Product, requested: i64) -> Option<StockViolation> {
    if product.stock <= 0 {
        Some(StockViolation::OutOfStock {
            product: product.name.clone(),
        })
    } else if product.stock < requested {
        Some(StockViolation::Shortage {
            product: product.name.clone(),
            available: product.stock,
            requested,
        })
    } else {
        None
    }
}

/// Rejects a sale of `requested` units when the shelf can't cover it.
///
/// ## Returns
/// * `Err(CoreError::OutOfStock)` - stock is zero (or below)
/// * `Err(CoreError::StockShortage)` - some stock, but not enough
pub fn check_availability(product: &Product, requested: i64) -> CoreResult<()> {
    match violation_for(product, requested) {
        Some(violation) => Err(violation.into_error()),
        None => Ok(()),
    }
}

// =============================================================================
// Batch Validation (multi-item voice sales)
// =============================================================================

/// Phase 1 of a multi-item sale.
///
/// Only quantity lines are checked. Lines whose product can't be resolved
/// are not violations here; they are reported later as omissions.
/// Each product is reported at most once, in the order it first appears.
pub fn validate_batch(items: &[SaleLine], catalog: &[Product]) -> Result<(), Vec<StockViolation>> {
    let mut requested: HashMap<&str, i64> = HashMap::new();
    let mut violations = Vec::new();
    let mut reported: Vec<&str> = Vec::new();

    for item in items.iter().filter(|i| i.is_quantity) {
        let Some(product) = resolve(&item.product, catalog) else {
            continue;
        };

        let total = requested.entry(product.id.as_str()).or_insert(0);
        *total = total.saturating_add(item.amount);

        if reported.contains(&product.id.as_str()) {
            continue;
        }
        if let Some(violation) = violation_for(product, *total) {
            reported.push(product.id.as_str());
            violations.push(violation);
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// A stock decrement the executor must apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDecrement {
    pub product_id: String,
    pub quantity: i64,
}

/// One row of a planned batch, with the stock movement it implies.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLine {
    pub transaction: NewTransaction,
    pub decrement: Option<StockDecrement>,
}

/// Phase 2 input: what to write for a validated batch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchPlan {
    pub lines: Vec<PlannedLine>,
    /// Quantity lines whose product couldn't be matched.
    pub failed_items: Vec<String>,
    pub total: i64,
}

impl BatchPlan {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Prices every line of a batch against the catalog.
///
/// Matched quantity lines become catalog-priced sales; cash lines become
/// unlinked sales; unmatched quantity lines go to `failed_items`. Every row
/// shares `group_id`.
///
/// ## Errors
/// `ValidationError::Overflow` when a line or the batch total doesn't fit.
pub fn plan_batch(items: &[SaleLine], catalog: &[Product], group_id: &str) -> CoreResult<BatchPlan> {
    let mut plan = BatchPlan::default();

    for item in items {
        if item.is_quantity {
            match resolve(&item.product, catalog) {
                Some(product) => {
                    let transaction =
                        NewTransaction::quantity_sale(product, item.amount, Some(group_id))?;
                    plan.total = add_to_total(plan.total, transaction.amount)?;
                    plan.lines.push(PlannedLine {
                        transaction,
                        decrement: Some(StockDecrement {
                            product_id: product.id.clone(),
                            quantity: item.amount,
                        }),
                    });
                }
                None => plan.failed_items.push(item.product.clone()),
            }
        } else {
            let description = if item.product.trim().is_empty() {
                GENERAL_SALE_LABEL
            } else {
                item.product.as_str()
            };
            plan.total = add_to_total(plan.total, item.amount)?;
            plan.lines.push(PlannedLine {
                transaction: NewTransaction::cash_sale(item.amount, description, Some(group_id)),
                decrement: None,
            });
        }
    }

    Ok(plan)
}

/// Adds one line to a running total, rejecting totals that don't fit.
pub fn add_to_total(total: i64, amount: i64) -> Result<i64, ValidationError> {
    Money::from_pesos(total)
        .checked_add(Money::from_pesos(amount))
        .map(|sum| sum.pesos())
        .ok_or_else(|| ValidationError::Overflow {
            field: "la venta".to_string(),
        })
}

// =============================================================================
// Cart Validation (POS checkout)
// =============================================================================

/// Phase 1 of a POS checkout. A line whose product id is not in the
/// catalog is a violation.
pub fn validate_cart(lines: &[CheckoutLine], catalog: &[Product]) -> Result<(), Vec<StockViolation>> {
    let mut requested: HashMap<&str, i64> = HashMap::new();
    let mut violations = Vec::new();

    for line in lines {
        let Some(product) = catalog.iter().find(|p| p.id == line.product_id) else {
            violations.push(StockViolation::Missing {
                product: line.name.clone(),
            });
            continue;
        };

        let total = requested.entry(product.id.as_str()).or_insert(0);
        *total = total.saturating_add(line.quantity);

        if product.stock < *total {
            violations.push(StockViolation::Shortage {
                product: line.name.clone(),
                available: product.stock,
                requested: *total,
            });
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionType;
    use chrono::Utc;

    fn product(id: &str, name: &str, price: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            merchant_id: "m-1".to_string(),
            name: name.to_string(),
            price,
            cost: 0,
            stock,
            min_stock: 5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn qty(amount: i64, name: &str) -> SaleLine {
        SaleLine {
            amount,
            product: name.to_string(),
            is_quantity: true,
        }
    }

    #[test]
    fn test_check_availability_variants() {
        let empty = product("1", "Pulsera", 1000, 0);
        assert_eq!(
            check_availability(&empty, 1),
            Err(CoreError::OutOfStock {
                product: "Pulsera".to_string()
            })
        );

        let low = product("1", "Pulsera", 1000, 2);
        assert_eq!(
            check_availability(&low, 3),
            Err(CoreError::StockShortage {
                product: "Pulsera".to_string(),
                available: 2,
                requested: 3,
            })
        );
        assert!(check_availability(&low, 2).is_ok());
    }

    #[test]
    fn test_validate_batch_reports_offender_and_skips_unmatched() {
        let catalog = vec![
            product("1", "Dubai", 1500, 10),
            product("2", "Macizo", 800, 1),
        ];
        let items = vec![qty(1, "dubai"), qty(3, "macizos"), qty(2, "alfajor")];

        let violations = validate_batch(&items, &catalog).unwrap_err();
        assert_eq!(
            violations,
            vec![StockViolation::Shortage {
                product: "Macizo".to_string(),
                available: 1,
                requested: 3,
            }]
        );
    }

    #[test]
    fn test_validate_batch_sums_repeated_products() {
        let catalog = vec![product("1", "Pan", 200, 4)];
        let items = vec![qty(2, "pan"), qty(3, "panes")];
        assert!(validate_batch(&items, &catalog).is_err());
    }

    #[test]
    fn test_validate_batch_ignores_cash_lines() {
        let catalog = vec![product("1", "Pan", 200, 0)];
        let items = vec![SaleLine {
            amount: 5000,
            product: "pan".to_string(),
            is_quantity: false,
        }];
        assert!(validate_batch(&items, &catalog).is_ok());
    }

    #[test]
    fn test_plan_batch() {
        let catalog = vec![product("1", "Dubai", 1500, 10)];
        let items = vec![
            qty(2, "dubai"),
            qty(1, "alfajor"),
            SaleLine {
                amount: 2000,
                product: "propina".to_string(),
                is_quantity: false,
            },
        ];

        let plan = plan_batch(&items, &catalog, "g-1").unwrap();
        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.failed_items, vec!["alfajor".to_string()]);
        assert_eq!(plan.total, 3000 + 2000);

        let first = &plan.lines[0];
        assert_eq!(first.transaction.kind, TransactionType::Sale);
        assert_eq!(first.transaction.amount, 3000);
        assert_eq!(
            first.decrement,
            Some(StockDecrement {
                product_id: "1".to_string(),
                quantity: 2
            })
        );

        let tip = &plan.lines[1];
        assert_eq!(tip.transaction.product_id, None);
        assert_eq!(tip.transaction.quantity, 1);
        assert!(tip.decrement.is_none());
        assert!(plan
            .lines
            .iter()
            .all(|l| l.transaction.group_id.as_deref() == Some("g-1")));
    }

    #[test]
    fn test_plan_batch_rejects_overflowing_total() {
        let catalog = vec![product("1", "Oro", 1500, 10)];
        let huge = |product: &str| SaleLine {
            amount: 9_000_000_000_000_000_000,
            product: product.to_string(),
            is_quantity: false,
        };

        let result = plan_batch(&[huge("oro"), huge("plata")], &catalog, "g-1");
        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::Overflow { .. }))
        ));
    }

    #[test]
    fn test_validate_cart() {
        let catalog = vec![product("1", "Pulsera", 1000, 2)];
        let lines = vec![
            CheckoutLine {
                product_id: "1".to_string(),
                name: "Pulsera".to_string(),
                unit_price: 1000,
                quantity: 3,
            },
            CheckoutLine {
                product_id: "ghost".to_string(),
                name: "Anillo".to_string(),
                unit_price: 500,
                quantity: 1,
            },
        ];

        let violations = validate_cart(&lines, &catalog).unwrap_err();
        assert_eq!(violations.len(), 2);
        assert_eq!(
            violations[0].clone().into_cart_error().to_string(),
            "Stock insuficiente para Pulsera. Disponibles: 2"
        );
        assert_eq!(
            violations[1].clone().into_cart_error().to_string(),
            "Producto no encontrado: Anillo"
        );
    }
}
