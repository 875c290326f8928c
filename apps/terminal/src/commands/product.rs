//! # Product Commands
//!
//! Catalog maintenance: creation (also the target of "nuevo producto ..."
//! utterances), deletion and the bulk stock editor.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::{ConfigState, DbState};
use emprende_core::validation::{
    validate_new_product, validate_price, validate_product_name, validate_quantity,
};
use emprende_core::{NewProduct, NewTransaction, Product, ProductUpdate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreated {
    pub product: Product,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateResult {
    pub success: bool,
    /// Number of stock-in movements recorded.
    pub count: usize,
}

/// Lists the merchant's catalog in creation order.
pub async fn list_products(db: &DbState, config: &ConfigState) -> ApiResult<Vec<Product>> {
    debug!("list_products command");
    Ok(db.inner().products().list_for_merchant(&config.merchant_id).await?)
}

/// Creates a product.
///
/// ## Validation
/// - Name: required, at most 100 characters
/// - Price, cost, stock and minimum stock: not negative
///
/// ## Returns
/// The stored product and `Producto "{name}" creado[ con N u.].`
pub async fn create_product(
    db: &DbState,
    config: &ConfigState,
    new: &NewProduct,
) -> ApiResult<ProductCreated> {
    debug!(name = %new.name, price = new.price, stock = new.stock, "create_product command");

    let new = NewProduct {
        name: new.name.trim().to_string(),
        ..new.clone()
    };
    validate_new_product(&new)?;

    let product = db.inner().products().insert(&config.merchant_id, &new).await?;
    info!(product_id = %product.id, name = %product.name, "Product created");

    let stock_note = if product.stock > 0 {
        format!(" con {} u", product.stock)
    } else {
        String::new()
    };
    let message = format!("Producto \"{}\" creado{}.", product.name, stock_note);

    Ok(ProductCreated { product, message })
}

/// Deletes one of the merchant's products. Its ledger rows stay, unlinked.
pub async fn delete_product(db: &DbState, config: &ConfigState, id: &str) -> ApiResult<()> {
    debug!(id = %id, "delete_product command");
    db.inner().products().delete(&config.merchant_id, id).await?;
    info!(id = %id, "Product deleted");
    Ok(())
}

/// Applies a batch of edits from the stock editor.
///
/// ## Behavior
/// ```text
/// for each update:
///   no changes            → skipped
///   name/price/cost/min   → written as given
///   add_stock > 0         → stock += n, INVENTORY_IN row (amount 0)
/// ```
/// All updates share one database transaction: an unknown id or an invalid
/// value leaves the whole catalog untouched.
///
/// ## Returns
/// The number of stock movements recorded.
pub async fn bulk_update_products(
    db: &DbState,
    config: &ConfigState,
    updates: &[ProductUpdate],
) -> ApiResult<BulkUpdateResult> {
    debug!(updates = updates.len(), "bulk_update_products command");
    let merchant_id = config.merchant_id.as_str();

    let mut uow = db.inner().begin().await?;
    let mut movements = 0;

    for update in updates {
        if !update.has_changes() {
            debug!(id = %update.id, "Skipping update without changes");
            continue;
        }

        let current = uow
            .product_by_id(merchant_id, &update.id)
            .await?
            .ok_or_else(|| {
                ApiError::not_found(format!("No se encontró el producto: {}", update.id))
            })?;

        let update = trimmed(update);
        validate_update(&update)?;

        if update.has_field_changes() {
            uow.update_product(merchant_id, &update).await?;
        }

        if let Some(added) = update.stock_delta() {
            let renamed = Product {
                name: update.name.clone().unwrap_or_else(|| current.name.clone()),
                ..current
            };
            uow.increment_stock(merchant_id, &renamed.id, added).await?;
            uow.record(merchant_id, &NewTransaction::inventory_in(&renamed, added))
                .await?;
            movements += 1;
        }
    }

    uow.commit().await?;
    info!(updates = updates.len(), movements, "Bulk product update committed");

    Ok(BulkUpdateResult {
        success: true,
        count: movements,
    })
}

fn trimmed(update: &ProductUpdate) -> ProductUpdate {
    ProductUpdate {
        name: update.name.as_ref().map(|n| n.trim().to_string()),
        ..update.clone()
    }
}

fn validate_update(update: &ProductUpdate) -> Result<(), ValidationError> {
    if let Some(name) = &update.name {
        validate_product_name(name)?;
    }
    if let Some(price) = update.price {
        validate_price("precio", price)?;
    }
    if let Some(cost) = update.cost {
        validate_price("costo", cost)?;
    }
    if let Some(min_stock) = update.min_stock {
        if min_stock < 0 {
            return Err(ValidationError::Negative {
                field: "stock mínimo".to_string(),
            });
        }
    }
    if let Some(added) = update.stock_delta() {
        validate_quantity(added)?;
    }
    Ok(())
}
