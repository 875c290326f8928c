//! # emprende-core: Pure Business Logic for Emprende
//!
//! This crate turns what a merchant says ("vendí 3 pulseras y 1 dubai") into
//! a typed command, matches spoken product names against the catalog, and
//! decides whether a sale can go through, all without touching storage.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Emprende Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Voice / Text / POS Cart Input                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ emprende-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   normalize ──► intent ──► resolver ──► stock (validation plan) │   │
//! │  │                                                                 │   │
//! │  │   insights (read-side aggregation over records)                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          emprende-db (SQLite) + terminal (executor)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`normalize`] - Case/accent folding and Spanish number words
//! - [`intent`] - Utterance → [`ParsedIntent`]
//! - [`resolver`] - Spoken name → catalog product
//! - [`stock`] - Validate-before-mutate checks for single, batch and cart sales
//! - [`insights`] - Sales, expense, inventory and risk aggregators
//! - [`types`] - Domain types (Product, Transaction, commands, outcomes)
//! - [`money`] - Whole-peso money with es-CL formatting
//! - [`error`] - Domain error types with Spanish user-facing messages
//! - [`validation`] - Input validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use emprende_core::intent::parse;
//! use emprende_core::ParsedIntent;
//!
//! let intent = parse("llegaron 50 latas");
//! assert_eq!(
//!     intent,
//!     ParsedIntent::InventoryRestock { amount: 50, product: "latas".to_string() }
//! );
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod insights;
pub mod intent;
pub mod money;
pub mod normalize;
pub mod resolver;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use intent::{ParsedIntent, SaleLine, QUANTITY_THRESHOLD};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Merchant used when no identity is supplied (single-merchant installs).
pub const DEFAULT_MERCHANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum distinct products allowed in a single POS cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product in a POS cart.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Minimum-stock threshold assigned to products created without one.
pub const DEFAULT_MIN_STOCK: i64 = 5;

/// Largest price, cost or cash amount accepted, in pesos.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Largest unit count accepted for one sale, restock or starting stock.
///
/// `MAX_AMOUNT × MAX_QUANTITY` still fits in an `i64`.
pub const MAX_QUANTITY: i64 = 1_000_000;
