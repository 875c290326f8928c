//! # POS Cart Commands
//!
//! Cart manipulation and checkout.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────────┐     ┌──────────┐   │
//! │  │  Empty   │────►│ In Cart  │────►│ checkout_cart│────►│ Committed│   │
//! │  │  Cart    │     │          │     │ (validate +  │     │ (cart    │   │
//! │  └──────────┘     └──────────┘     │  commit)     │     │ cleared) │   │
//! │                        │           └──────┬───────┘     └──────────┘   │
//! │                   add_to_cart             │                             │
//! │                   update_cart_item        │ rejected: cart kept as is   │
//! │                   remove_from_cart        ▼                             │
//! │                        │              (In Cart)                         │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────► (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::transaction::commit_cart_checkout;
use crate::error::{ApiError, ApiResult};
use crate::state::{Cart, CartItem, CartState, CartTotals, ConfigState, DbState};
use emprende_core::CheckoutOutcome;

/// Cart response including items and totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    pub totals: CartTotals,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        CartResponse {
            items: cart.items.clone(),
            totals: CartTotals::from(cart),
        }
    }
}

pub fn get_cart(cart: &CartState) -> CartResponse {
    debug!("get_cart command");
    cart.with_cart(|c| CartResponse::from(c))
}

/// Adds a product to the cart.
///
/// The product is read from the catalog now and its price is frozen into
/// the line. Stock is checked at checkout, not here.
///
/// ## Arguments
/// * `product_id` - Product UUID to add
/// * `quantity` - Quantity to add (default: 1)
pub async fn add_to_cart(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    product_id: &str,
    quantity: Option<i64>,
) -> ApiResult<CartResponse> {
    let quantity = quantity.unwrap_or(1);
    debug!(product_id = %product_id, quantity, "add_to_cart command");

    let product = db
        .inner()
        .products()
        .get_by_id(&config.merchant_id, product_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No se encontró el producto: {}", product_id)))?;

    let response = cart.with_cart_mut(|c| {
        c.add_item(&product, quantity)?;
        Ok::<CartResponse, ApiError>(CartResponse::from(&*c))
    })?;

    Ok(response)
}

/// Sets a line's quantity. 0 removes the line.
pub fn update_cart_item(
    cart: &CartState,
    product_id: &str,
    quantity: i64,
) -> ApiResult<CartResponse> {
    debug!(product_id = %product_id, quantity, "update_cart_item command");

    cart.with_cart_mut(|c| {
        c.update_quantity(product_id, quantity)?;
        Ok::<CartResponse, ApiError>(CartResponse::from(&*c))
    })
}

pub fn remove_from_cart(cart: &CartState, product_id: &str) -> ApiResult<CartResponse> {
    debug!(product_id = %product_id, "remove_from_cart command");

    cart.with_cart_mut(|c| {
        c.remove_item(product_id)?;
        Ok::<CartResponse, ApiError>(CartResponse::from(&*c))
    })
}

pub fn clear_cart(cart: &CartState) -> CartResponse {
    debug!("clear_cart command");

    cart.with_cart_mut(|c| {
        c.clear();
        CartResponse::from(&*c)
    })
}

/// Charges the current cart.
///
/// ## Returns
/// * `Ok(CheckoutOutcome)` - the cart is cleared
/// * `Err(ApiError)` - empty cart or a stock problem; the cart is kept so the
///   merchant can fix the offending line
pub async fn checkout_cart(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    payment_method: Option<&str>,
) -> ApiResult<CheckoutOutcome> {
    let method = payment_method.unwrap_or(config.default_payment_method.as_str());
    debug!(payment_method = %method, "checkout_cart command");

    let (lines, total) = cart.with_cart(|c| (c.to_checkout_lines(), c.total()));

    let outcome = commit_cart_checkout(db, config, &lines, total, method).await?;

    cart.with_cart_mut(Cart::clear);
    info!(group_id = %outcome.group_id, total = outcome.total, "Cart charged");

    Ok(outcome)
}
