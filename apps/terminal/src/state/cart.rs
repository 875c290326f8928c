//! # Cart State
//!
//! Manages the current POS cart.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Console Action           Command                 Cart State Change     │
//! │  ──────────────           ───────                 ─────────────────     │
//! │                                                                         │
//! │  /carrito <id> <n> ──────► add_to_cart() ───────► items.push(item)     │
//! │                                                                         │
//! │  (quantity change) ──────► update_cart_item() ──► items[i].qty = n     │
//! │                                                                         │
//! │  /quitar <id> ───────────► remove_from_cart() ──► items.remove(i)      │
//! │                                                                         │
//! │  /vaciar ────────────────► clear_cart() ────────► items.clear()        │
//! │                                                                         │
//! │  /cobrar ────────────────► checkout_cart() ─────► items.clear() on Ok  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is not checked while the cart is being built. Checkout validates
//! every line against the shelf before anything is written.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use emprende_core::validation::{validate_cart_quantity, validate_cart_size, validate_quantity};
use emprende_core::{CheckoutLine, CoreError, CoreResult, Product};

/// An item in the cart.
///
/// Name and price are copied from the product when it is added, so the
/// cart keeps charging what the merchant saw even if the catalog changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,

    /// Product name at time of adding (frozen)
    pub name: String,

    /// Unit price in pesos at time of adding (frozen)
    pub unit_price: i64,

    pub quantity: i64,

    pub added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
            added_at: Utc::now(),
        }
    }

    pub fn line_total(&self) -> i64 {
        self.unit_price.saturating_mul(self.quantity)
    }

    fn to_checkout_line(&self) -> CheckoutLine {
        CheckoutLine {
            product_id: self.product_id.clone(),
            name: self.name.clone(),
            unit_price: self.unit_price,
            quantity: self.quantity,
        }
    }
}

/// The POS cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding same product increases quantity)
/// - Quantity is always > 0 (setting it to 0 removes the item)
/// - At most [`emprende_core::MAX_CART_ITEMS`] lines
/// - At most [`emprende_core::MAX_ITEM_QUANTITY`] units per line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,

    /// When the cart was created/last cleared
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a product to the cart or increases quantity if already present.
    ///
    /// ## Returns
    /// - `Ok(())` on success
    /// - `Err(CoreError)` if the quantity is not positive, the merged
    ///   quantity passes the per-line maximum, or the cart is full
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + quantity;
            validate_cart_quantity(new_qty)?;
            item.quantity = new_qty;
            return Ok(());
        }

        validate_cart_quantity(quantity)?;
        validate_cart_size(self.items.len())?;

        self.items.push(CartItem::from_product(product, quantity));
        Ok(())
    }

    /// Sets the quantity of a line. Quantity 0 removes it.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }

        validate_quantity(quantity)?;
        validate_cart_quantity(quantity)?;

        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.quantity = quantity;
                Ok(())
            }
            None => Err(not_in_cart(product_id)),
        }
    }

    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(not_in_cart(product_id))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.created_at = Utc::now();
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Σ frozen price × quantity.
    pub fn total(&self) -> i64 {
        emprende_core::insights::saturating_sum(self.items.iter().map(CartItem::line_total))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Lines in the shape the checkout executor takes.
    pub fn to_checkout_lines(&self) -> Vec<CheckoutLine> {
        self.items.iter().map(CartItem::to_checkout_line).collect()
    }
}

fn not_in_cart(product_id: &str) -> CoreError {
    CoreError::NotInCart {
        product_id: product_id.to_string(),
    }
}

/// Cart totals summary for command responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub total: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            total: cart.total(),
        }
    }
}

/// Shared cart state.
///
/// `Arc<Mutex<Cart>>`: commands may run on any runtime worker, and only one
/// of them may change the cart at a time.
#[derive(Debug, Clone)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    pub fn new() -> Self {
        CartState {
            cart: Arc::new(Mutex::new(Cart::new())),
        }
    }

    /// Executes a function with read access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = cart_state.with_cart(|cart| CartTotals::from(cart));
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        // A panic while holding the lock leaves the cart itself intact
        let cart = self.cart.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// cart_state.with_cart_mut(|cart| cart.add_item(&product, 1))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut cart)
    }
}

impl Default for CartState {
    fn default() -> Self {
        Self::new()
    }
}
