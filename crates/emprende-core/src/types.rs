//! # Domain Types
//!
//! The shapes every layer shares: catalog products, ledger transactions,
//! executor commands and their outcomes.
//!
//! ## Entity Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Product ◄──────────── Transaction (product_id, nullable)              │
//! │  (stock mutates)        │                                               │
//! │                         ├── kind: SALE | EXPENSE | INVENTORY_IN         │
//! │                         └── group_id: links rows of one multi-item      │
//! │                             sale or one POS checkout                    │
//! │                                                                         │
//! │  Transactions are immutable once written; only deletion is allowed.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::DEFAULT_MIN_STOCK;

// =============================================================================
// Product
// =============================================================================

/// A product in a merchant's catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Merchant this product belongs to.
    pub merchant_id: String,

    /// Display name. Not guaranteed unique.
    pub name: String,

    /// Unit sale price in pesos.
    pub price: i64,

    /// Unit cost in pesos (0 when unknown).
    pub cost: i64,

    /// Units on the shelf. The executor never drives this below 0.
    pub stock: i64,

    /// Low-stock threshold used by insights and risk alerts.
    pub min_stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_pesos(self.price)
    }

    /// Price of `quantity` units.
    #[inline]
    pub fn line_amount(&self, quantity: i64) -> Result<i64, ValidationError> {
        checked_line(self.unit_price(), quantity)
    }

    /// Shelf value at sale price, ignoring negative stock. Saturates.
    pub fn stock_value(&self) -> i64 {
        self.price.saturating_mul(self.stock.max(0))
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub stock: i64,
    /// Defaults to 0.
    pub cost: Option<i64>,
    /// Defaults to [`DEFAULT_MIN_STOCK`].
    pub min_stock: Option<i64>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: i64, stock: i64) -> Self {
        NewProduct {
            name: name.into(),
            price,
            stock,
            cost: None,
            min_stock: None,
        }
    }

    pub fn cost_or_default(&self) -> i64 {
        self.cost.unwrap_or(0)
    }

    pub fn min_stock_or_default(&self) -> i64 {
        self.min_stock.unwrap_or(DEFAULT_MIN_STOCK)
    }
}

/// One row of the bulk product editor.
///
/// Every field except `id` is optional; `add_stock` is a delta and produces
/// an `INVENTORY_IN` record when positive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductUpdate {
    pub id: String,
    pub name: Option<String>,
    pub price: Option<i64>,
    pub cost: Option<i64>,
    pub min_stock: Option<i64>,
    pub add_stock: Option<i64>,
}

impl ProductUpdate {
    /// Positive stock delta, if any.
    pub fn stock_delta(&self) -> Option<i64> {
        self.add_stock.filter(|n| *n > 0)
    }

    pub fn has_field_changes(&self) -> bool {
        self.name.is_some() || self.price.is_some() || self.cost.is_some() || self.min_stock.is_some()
    }

    pub fn has_changes(&self) -> bool {
        self.has_field_changes() || self.stock_delta().is_some()
    }
}

// =============================================================================
// Transaction Type
// =============================================================================

/// Ledger row kind. Restocks are stored as `INVENTORY_IN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum TransactionType {
    Sale,
    Expense,
    InventoryIn,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "SALE",
            TransactionType::Expense => "EXPENSE",
            TransactionType::InventoryIn => "INVENTORY_IN",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// Well-known payment method tags. Stored as free text so new methods
/// don't need a migration.
pub mod payment_method {
    pub const CASH: &str = "CASH";
    pub const DEBIT: &str = "DEBIT";
    pub const CREDIT: &str = "CREDIT";
    pub const TRANSFER: &str = "TRANSFER";
}

// =============================================================================
// Transaction
// =============================================================================

/// A persisted ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    pub merchant_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Pesos. Zero for pure stock-in records.
    pub amount: i64,
    pub quantity: i64,
    pub description: String,
    pub product_id: Option<String>,
    pub group_id: Option<String>,
    pub payment_method: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A transaction row prepared by the executor, before it has an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: i64,
    pub quantity: i64,
    pub description: String,
    pub product_id: Option<String>,
    pub group_id: Option<String>,
    pub payment_method: Option<String>,
}

impl NewTransaction {
    /// A sale priced from the catalog: `amount = price × quantity`.
    pub fn quantity_sale(
        product: &Product,
        quantity: i64,
        group_id: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Ok(NewTransaction {
            kind: TransactionType::Sale,
            amount: product.line_amount(quantity)?,
            quantity,
            description: product.name.clone(),
            product_id: Some(product.id.clone()),
            group_id: group_id.map(str::to_string),
            payment_method: None,
        })
    }

    /// A sale stated directly as money, with no catalog link.
    pub fn cash_sale(amount: i64, description: impl Into<String>, group_id: Option<&str>) -> Self {
        NewTransaction {
            kind: TransactionType::Sale,
            amount,
            quantity: 1,
            description: description.into(),
            product_id: None,
            group_id: group_id.map(str::to_string),
            payment_method: None,
        }
    }

    pub fn expense(amount: i64, description: impl Into<String>) -> Self {
        NewTransaction {
            kind: TransactionType::Expense,
            amount,
            quantity: 1,
            description: description.into(),
            product_id: None,
            group_id: None,
            payment_method: None,
        }
    }

    /// Stock-in record: no financial value, quantity carries the delta.
    pub fn inventory_in(product: &Product, quantity: i64) -> Self {
        NewTransaction {
            kind: TransactionType::InventoryIn,
            amount: 0,
            quantity,
            description: product.name.clone(),
            product_id: Some(product.id.clone()),
            group_id: None,
            payment_method: None,
        }
    }

    /// One POS checkout line, priced at the cart's frozen unit price.
    pub fn pos_line(
        line: &CheckoutLine,
        group_id: &str,
        payment_method: &str,
    ) -> Result<Self, ValidationError> {
        Ok(NewTransaction {
            kind: TransactionType::Sale,
            amount: line.line_amount()?,
            quantity: line.quantity,
            description: format!("Venta POS: {}x {}", line.quantity, line.name),
            product_id: Some(line.product_id.clone()),
            group_id: Some(group_id.to_string()),
            payment_method: Some(payment_method.to_string()),
        })
    }
}

// =============================================================================
// Executor Commands
// =============================================================================

/// What a single commit does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum CommandKind {
    Sale,
    Restock,
    Expense,
}

/// Input to a single-item commit.
///
/// `amount` is a unit count for restocks and quantity sales, and pesos
/// otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SingleCommand {
    pub kind: CommandKind,
    pub amount: i64,
    pub description: String,
    pub is_quantity: bool,
}

impl SingleCommand {
    pub fn sale(amount: i64, description: impl Into<String>, is_quantity: bool) -> Self {
        SingleCommand {
            kind: CommandKind::Sale,
            amount,
            description: description.into(),
            is_quantity,
        }
    }

    pub fn restock(quantity: i64, product: impl Into<String>) -> Self {
        SingleCommand {
            kind: CommandKind::Restock,
            amount: quantity,
            description: product.into(),
            is_quantity: true,
        }
    }

    pub fn expense(amount: i64, description: impl Into<String>) -> Self {
        SingleCommand {
            kind: CommandKind::Expense,
            amount,
            description: description.into(),
            is_quantity: false,
        }
    }
}

/// A POS cart line, already bound to a product id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutLine {
    pub product_id: String,
    pub name: String,
    /// Price frozen when the product was added to the cart.
    pub unit_price: i64,
    pub quantity: i64,
}

impl CheckoutLine {
    pub fn line_amount(&self) -> Result<i64, ValidationError> {
        checked_line(Money::from_pesos(self.unit_price), self.quantity)
    }
}

fn checked_line(unit_price: Money, quantity: i64) -> Result<i64, ValidationError> {
    unit_price
        .checked_multiply_quantity(quantity)
        .map(|line| line.pesos())
        .ok_or_else(|| ValidationError::Overflow {
            field: "la venta".to_string(),
        })
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a single-item commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CommitOutcome {
    pub success: bool,
    /// Set for stock-touching paths; cash sales and expenses leave it empty.
    pub message: Option<String>,
    /// Final recorded amount (price × quantity for quantity sales).
    pub amount: i64,
}

/// Result of a multi-item commit. `success == false` is a soft failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BatchOutcome {
    pub success: bool,
    pub amount: Option<i64>,
    pub message: String,
    /// Product names that could not be matched and were left out.
    pub failed_items: Vec<String>,
}

/// Result of a POS cart checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutOutcome {
    pub success: bool,
    pub group_id: String,
    pub total: i64,
    pub lines: usize,
}

// =============================================================================
// Unit Tests
// =============================================================================
