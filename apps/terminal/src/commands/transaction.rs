//! # Transaction Commands
//!
//! The stock-aware executor plus ledger listing and deletion.
//!
//! ## Commit Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Commit                                           │
//! │                                                                         │
//! │  Received ──► Validating ──┬──► Rejected(reason)   nothing written     │
//! │                            │                                            │
//! │                            └──► Committing ──► Committed                │
//! │                                                                         │
//! │  Validating and Committing share ONE SQLite transaction:               │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    read catalog          (same connection as the writes)               │
//! │    resolve + validate    (emprende_core::stock)                        │
//! │    UPDATE stock ... WHERE stock >= n    ◄── guarded, per line          │
//! │    INSERT transactions                                                 │
//! │  COMMIT                  (any error before this drops → ROLLBACK)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A stock decrement and its ledger row are written together or not at all,
//! and a concurrent sale can never push stock below zero.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::{ConfigState, DbState};
use emprende_core::intent::{GENERAL_EXPENSE_LABEL, GENERAL_SALE_LABEL};
use emprende_core::resolver::resolve;
use emprende_core::stock::{
    add_to_total, check_availability, plan_batch, validate_batch, validate_cart,
};
use emprende_core::validation::{parse_local_date, validate_amount, validate_quantity};
use emprende_core::{
    payment_method, BatchOutcome, CheckoutLine, CheckoutOutcome, CommandKind, CommitOutcome,
    CoreError, Money, NewTransaction, Product, SaleLine, SingleCommand, Transaction,
    ValidationError,
};
use emprende_db::{DbError, UnitOfWork};

/// Soft-failure message when no line of a multi-item sale could be recorded.
pub const NOTHING_IDENTIFIED: &str = "No se pudo identificar ningún producto.";

// =============================================================================
// Single Commit
// =============================================================================

/// Commits one sale, restock or expense.
///
/// ## Paths
/// ```text
/// Restock            name LIKE %text% (resolver as fallback) → stock += n,
///                    INVENTORY_IN row with amount 0
/// Sale, quantity     resolver → stock check → stock -= n,
///                    SALE row with amount = price × n
/// Sale, cash         SALE row with the stated amount, no product
/// Expense            EXPENSE row with the stated amount
/// ```
///
/// ## Returns
/// * `Ok(CommitOutcome)` - with a message on the restock and quantity paths
/// * `Err(ApiError)` - product not found, stock rejected or invalid amount;
///   nothing was written
pub async fn commit_single(
    db: &DbState,
    config: &ConfigState,
    command: &SingleCommand,
) -> ApiResult<CommitOutcome> {
    debug!(
        kind = ?command.kind,
        amount = command.amount,
        is_quantity = command.is_quantity,
        "commit_single command"
    );
    let merchant_id = config.merchant_id.as_str();

    match command.kind {
        CommandKind::Restock => commit_restock(db, merchant_id, command).await,
        CommandKind::Sale if command.is_quantity => {
            commit_quantity_sale(db, merchant_id, command).await
        }
        CommandKind::Sale => {
            validate_amount(command.amount)?;
            let description = label_or(&command.description, GENERAL_SALE_LABEL);
            record_unlinked(
                db,
                merchant_id,
                NewTransaction::cash_sale(command.amount, description, None),
            )
            .await
        }
        CommandKind::Expense => {
            validate_amount(command.amount)?;
            let description = label_or(&command.description, GENERAL_EXPENSE_LABEL);
            record_unlinked(
                db,
                merchant_id,
                NewTransaction::expense(command.amount, description),
            )
            .await
        }
    }
}

async fn commit_restock(
    db: &DbState,
    merchant_id: &str,
    command: &SingleCommand,
) -> ApiResult<CommitOutcome> {
    let quantity = command.amount;
    validate_quantity(quantity)?;

    let query = command.description.trim();
    if query.is_empty() {
        return Err(ValidationError::Required {
            field: "producto".to_string(),
        }
        .into());
    }

    let mut uow = db.inner().begin().await?;

    let product = match uow.find_product_containing(merchant_id, query).await? {
        Some(product) => product,
        None => {
            // "reponer 10 pulseras" when the catalog says "Pulsera"
            let catalog = uow.products_for_merchant(merchant_id).await?;
            resolve(query, &catalog)
                .cloned()
                .ok_or_else(|| CoreError::RestockProductNotFound {
                    query: query.to_string(),
                })?
        }
    };

    uow.increment_stock(merchant_id, &product.id, quantity).await?;
    uow.record(merchant_id, &NewTransaction::inventory_in(&product, quantity))
        .await?;
    uow.commit().await?;

    let new_stock = product.stock + quantity;
    info!(
        product_id = %product.id,
        quantity,
        new_stock,
        "Restock committed"
    );

    Ok(CommitOutcome {
        success: true,
        message: Some(format!(
            "Repuestos {} {}. Nuevo stock: {}.",
            quantity, product.name, new_stock
        )),
        amount: 0,
    })
}

async fn commit_quantity_sale(
    db: &DbState,
    merchant_id: &str,
    command: &SingleCommand,
) -> ApiResult<CommitOutcome> {
    let quantity = command.amount;
    validate_quantity(quantity)?;

    let mut uow = db.inner().begin().await?;
    let catalog = uow.products_for_merchant(merchant_id).await?;

    let product = resolve(&command.description, &catalog)
        .cloned()
        .ok_or_else(|| CoreError::SaleProductNotFound {
            query: command.description.trim().to_string(),
        })?;

    if let Err(err) = check_availability(&product, quantity) {
        warn!(
            product_id = %product.id,
            stock = product.stock,
            requested = quantity,
            "Sale rejected"
        );
        return Err(err.into());
    }

    let row = NewTransaction::quantity_sale(&product, quantity, None)?;
    decrement(&mut uow, merchant_id, &product.id, quantity, None).await?;
    uow.record(merchant_id, &row).await?;
    uow.commit().await?;

    info!(
        product_id = %product.id,
        quantity,
        amount = row.amount,
        "Quantity sale committed"
    );

    Ok(CommitOutcome {
        success: true,
        message: Some(format!(
            "Venta de {} {} ({}) registrada. Quedan {}.",
            quantity,
            product.name,
            Money::from_pesos(row.amount),
            product.stock - quantity
        )),
        amount: row.amount,
    })
}

/// Cash sales and expenses: one row, no stock.
async fn record_unlinked(
    db: &DbState,
    merchant_id: &str,
    row: NewTransaction,
) -> ApiResult<CommitOutcome> {
    let recorded = db.inner().transactions().insert(merchant_id, &row).await?;
    info!(id = %recorded.id, kind = %recorded.kind, amount = recorded.amount, "Transaction committed");

    Ok(CommitOutcome {
        success: true,
        message: None,
        amount: recorded.amount,
    })
}

// =============================================================================
// Multi-Item Commit
// =============================================================================

/// Commits a spoken multi-item sale ("vendí 1 dubai y 3 macizos").
///
/// ## Two Phases
/// ```text
/// Phase 1: validate_batch   every quantity line whose product resolves
///                           must be coverable by stock (summed per product).
///                           First violation aborts; nothing written.
///
/// Phase 2: plan_batch       matched lines → priced rows + decrements
///                           unmatched quantity lines → failed_items
///                           cash lines → unlinked rows
///          write            all rows share one group id
/// ```
///
/// ## Returns
/// * `Ok(BatchOutcome { success: false, .. })` - no line could be recorded
/// * `Ok(BatchOutcome { success: true, .. })` - total, count message, and
///   the names that were left out
/// * `Err(ApiError)` - a stock violation; nothing was written
pub async fn commit_multi_item(
    db: &DbState,
    config: &ConfigState,
    items: &[SaleLine],
) -> ApiResult<BatchOutcome> {
    debug!(lines = items.len(), "commit_multi_item command");
    let merchant_id = config.merchant_id.as_str();

    for item in items {
        if item.is_quantity {
            validate_quantity(item.amount)?;
        } else {
            validate_amount(item.amount)?;
        }
    }

    let mut uow = db.inner().begin().await?;
    let catalog = uow.products_for_merchant(merchant_id).await?;

    if let Err(violations) = validate_batch(items, &catalog) {
        warn!(violations = violations.len(), "Multi-item sale rejected");
        if let Some(first) = violations.into_iter().next() {
            return Err(first.into_error().into());
        }
    }

    let group_id = Uuid::new_v4().to_string();
    let plan = plan_batch(items, &catalog, &group_id)?;

    if plan.is_empty() {
        debug!(failed = plan.failed_items.len(), "No line of the batch matched");
        return Ok(BatchOutcome {
            success: false,
            amount: None,
            message: NOTHING_IDENTIFIED.to_string(),
            failed_items: plan.failed_items,
        });
    }

    for dec in plan.lines.iter().filter_map(|line| line.decrement.as_ref()) {
        decrement(&mut uow, merchant_id, &dec.product_id, dec.quantity, None).await?;
    }
    let rows: Vec<NewTransaction> = plan
        .lines
        .iter()
        .map(|line| line.transaction.clone())
        .collect();
    uow.record_many(merchant_id, &rows).await?;
    uow.commit().await?;

    let count = plan.lines.len();
    info!(
        group_id = %group_id,
        lines = count,
        total = plan.total,
        failed = plan.failed_items.len(),
        "Multi-item sale committed"
    );

    Ok(BatchOutcome {
        success: true,
        amount: Some(plan.total),
        message: format!(
            "Venta de {} {} registrada.",
            count,
            if count == 1 { "producto" } else { "productos" }
        ),
        failed_items: plan.failed_items,
    })
}

// =============================================================================
// POS Cart Checkout
// =============================================================================

/// Commits an explicit cart of product ids.
///
/// Every line is validated against current stock before any write. Rows are
/// priced at the cart's frozen unit prices and tagged with the payment
/// method. If `total` disagrees with the lines, the lines win.
///
/// ## Arguments
/// * `lines` - Cart lines (product id, frozen price, quantity)
/// * `total` - Total the customer was shown
/// * `payment_method` - Free string; blank means `CASH`
pub async fn commit_cart_checkout(
    db: &DbState,
    config: &ConfigState,
    lines: &[CheckoutLine],
    total: i64,
    payment_method: &str,
) -> ApiResult<CheckoutOutcome> {
    debug!(lines = lines.len(), total, payment_method, "commit_cart_checkout command");
    let merchant_id = config.merchant_id.as_str();

    if lines.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }
    for line in lines {
        validate_quantity(line.quantity)?;
    }

    let method = normalize_payment_method(payment_method);

    let mut uow = db.inner().begin().await?;
    let catalog = uow.products_for_merchant(merchant_id).await?;

    if let Err(violations) = validate_cart(lines, &catalog) {
        warn!(violations = violations.len(), "Checkout rejected");
        if let Some(first) = violations.into_iter().next() {
            return Err(first.into_cart_error().into());
        }
    }

    let computed = lines.iter().try_fold(0_i64, |total, line| {
        add_to_total(total, line.line_amount()?)
    })?;
    if computed != total {
        warn!(shown = total, computed, "Cart total mismatch, using line sum");
    }

    let group_id = Uuid::new_v4().to_string();
    let rows = lines
        .iter()
        .map(|line| NewTransaction::pos_line(line, &group_id, &method))
        .collect::<Result<Vec<_>, _>>()?;

    for line in lines {
        decrement(
            &mut uow,
            merchant_id,
            &line.product_id,
            line.quantity,
            Some(&line.name),
        )
        .await?;
    }
    uow.record_many(merchant_id, &rows).await?;
    uow.commit().await?;

    info!(
        group_id = %group_id,
        lines = lines.len(),
        total = computed,
        payment_method = %method,
        "Checkout committed"
    );

    Ok(CheckoutOutcome {
        success: true,
        group_id,
        total: computed,
        lines: lines.len(),
    })
}

fn normalize_payment_method(method: &str) -> String {
    let method = method.trim();
    if method.is_empty() {
        payment_method::CASH.to_string()
    } else {
        method.to_uppercase()
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Deletes one ledger row of this merchant. Stock is not restored.
pub async fn delete_transaction(db: &DbState, config: &ConfigState, id: &str) -> ApiResult<()> {
    debug!(id = %id, "delete_transaction command");
    db.inner()
        .transactions()
        .delete(&config.merchant_id, id)
        .await?;
    info!(id = %id, "Transaction deleted");
    Ok(())
}

/// Rows between two local calendar dates, both inclusive, newest first.
///
/// ## Arguments
/// * `from` - `YYYY-MM-DD`, from 00:00:00 local time
/// * `to` - `YYYY-MM-DD`, through 23:59:59.999 local time
pub async fn list_transactions_by_range(
    db: &DbState,
    config: &ConfigState,
    from: &str,
    to: &str,
) -> ApiResult<Vec<Transaction>> {
    debug!(from = %from, to = %to, "list_transactions_by_range command");

    let from_date = parse_local_date("desde", from)?;
    let to_date = parse_local_date("hasta", to)?;
    if to_date < from_date {
        return Err(ValidationError::InvalidFormat {
            field: "hasta".to_string(),
            reason: "es anterior a la fecha de inicio".to_string(),
        }
        .into());
    }

    let start = local_midnight_utc(from_date, config)?;
    let end = local_midnight_utc(to_date.succ_opt().unwrap_or(to_date), config)?;

    let rows = db
        .inner()
        .transactions()
        .list_by_range(&config.merchant_id, start, end)
        .await?;
    Ok(rows)
}

fn local_midnight_utc(date: NaiveDate, config: &ConfigState) -> ApiResult<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(config.utc_offset()).single())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| ApiError::validation(format!("Fecha fuera de rango: {}", date)))
}

// =============================================================================
// Helpers
// =============================================================================

fn label_or<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}

/// Guarded decrement. A conflict is reported with the same wording as a
/// failed validation, computed from the stock that is there now.
async fn decrement(
    uow: &mut UnitOfWork,
    merchant_id: &str,
    product_id: &str,
    quantity: i64,
    cart_name: Option<&str>,
) -> ApiResult<()> {
    match uow.decrement_stock(merchant_id, product_id, quantity).await {
        Ok(()) => Ok(()),
        Err(conflict @ DbError::StockConflict { .. }) => {
            let current = uow.product_by_id(merchant_id, product_id).await?;
            Err(explain_conflict(current, quantity, cart_name).unwrap_or_else(|| conflict.into()))
        }
        Err(e) => Err(e.into()),
    }
}

fn explain_conflict(
    current: Option<Product>,
    quantity: i64,
    cart_name: Option<&str>,
) -> Option<ApiError> {
    match (current, cart_name) {
        (Some(product), Some(name)) => Some(
            CoreError::CartStockShortage {
                name: name.to_string(),
                available: product.stock.max(0),
            }
            .into(),
        ),
        (None, Some(name)) => Some(
            CoreError::CartProductMissing {
                name: name.to_string(),
            }
            .into(),
        ),
        (Some(product), None) => check_availability(&product, quantity).err().map(Into::into),
        (None, None) => None,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use emprende_core::{NewProduct, TransactionType, DEFAULT_MERCHANT_ID};
    use emprende_db::{Database, DbConfig};

    async fn setup() -> (DbState, ConfigState) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        (DbState::new(db), ConfigState::default())
    }

    async fn add_product(db: &DbState, config: &ConfigState, name: &str, price: i64, stock: i64) -> Product {
        db.inner()
            .products()
            .insert(&config.merchant_id, &NewProduct::new(name, price, stock))
            .await
            .unwrap()
    }

    async fn stock_of(db: &DbState, id: &str) -> i64 {
        db.inner()
            .products()
            .get_by_id(DEFAULT_MERCHANT_ID, id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    async fn ledger(db: &DbState, config: &ConfigState) -> Vec<Transaction> {
        let mut rows = Vec::new();
        for kind in [TransactionType::Sale, TransactionType::Expense, TransactionType::InventoryIn] {
            rows.extend(
                db.inner()
                    .transactions()
                    .list_by_type(&config.merchant_id, kind)
                    .await
                    .unwrap(),
            );
        }
        rows
    }

    fn line(amount: i64, product: &str, is_quantity: bool) -> SaleLine {
        SaleLine {
            amount,
            product: product.to_string(),
            is_quantity,
        }
    }

    // -------------------------------------------------------------------------
    // Single commit
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_quantity_sale_prices_from_catalog() {
        let (db, config) = setup().await;
        let pulsera = add_product(&db, &config, "Pulsera", 1500, 10).await;

        let outcome = commit_single(&db, &config, &SingleCommand::sale(3, "pulseras", true))
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.amount, 4500);
        assert_eq!(
            outcome.message.as_deref(),
            Some("Venta de 3 Pulsera ($4.500) registrada. Quedan 7.")
        );
        assert_eq!(stock_of(&db, &pulsera.id).await, 7);

        let rows = ledger(&db, &config).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 3);
        assert_eq!(rows[0].description, "Pulsera");
        assert_eq!(rows[0].product_id.as_deref(), Some(pulsera.id.as_str()));
    }

    #[tokio::test]
    async fn test_zero_stock_sale_rejected_without_side_effects() {
        let (db, config) = setup().await;
        let pan = add_product(&db, &config, "Pan amasado", 200, 0).await;

        let err = commit_single(&db, &config, &SingleCommand::sale(1, "pan amasado", true))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(
            err.message,
            "No puedes vender Pan amasado (Stock: 0). Repone stock u ofrece otra opción al cliente."
        );
        assert_eq!(stock_of(&db, &pan.id).await, 0);
        assert!(ledger(&db, &config).await.is_empty());
    }

    #[tokio::test]
    async fn test_shortage_names_remaining_units() {
        let (db, config) = setup().await;
        let dubai = add_product(&db, &config, "Dubai", 1500, 2).await;

        let err = commit_single(&db, &config, &SingleCommand::sale(5, "dubai", true))
            .await
            .unwrap_err();

        assert_eq!(
            err.message,
            "Solo tienes 2 unidades de Dubai. Repone stock si quieres completar el pedido."
        );
        assert_eq!(stock_of(&db, &dubai.id).await, 2);
        assert!(ledger(&db, &config).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_sale_guides_user() {
        let (db, config) = setup().await;
        add_product(&db, &config, "Pulsera", 1500, 10).await;

        let err = commit_single(&db, &config, &SingleCommand::sale(2, "alfajores", true))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(err.message.contains("Crea el producto primero o di el monto en dinero"));
    }

    #[tokio::test]
    async fn test_cash_sale_and_expense() {
        let (db, config) = setup().await;

        let sale = commit_single(&db, &config, &SingleCommand::sale(5000, "", false))
            .await
            .unwrap();
        assert_eq!(sale.amount, 5000);
        assert_eq!(sale.message, None);

        let expense = commit_single(&db, &config, &SingleCommand::expense(2000, "taxi"))
            .await
            .unwrap();
        assert_eq!(expense.amount, 2000);

        let rows = ledger(&db, &config).await;
        let sale_row = rows.iter().find(|r| r.kind == TransactionType::Sale).unwrap();
        assert_eq!(sale_row.description, "Venta General");
        assert_eq!(sale_row.product_id, None);
        assert_eq!(sale_row.quantity, 1);

        let expense_row = rows.iter().find(|r| r.kind == TransactionType::Expense).unwrap();
        assert_eq!(expense_row.description, "taxi");
    }

    #[tokio::test]
    async fn test_non_positive_amounts_rejected() {
        let (db, config) = setup().await;
        add_product(&db, &config, "Pulsera", 1500, 10).await;

        let err = commit_single(&db, &config, &SingleCommand::sale(0, "pulsera", true))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = commit_single(&db, &config, &SingleCommand::expense(-5, "luz"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(ledger(&db, &config).await.is_empty());
    }

    #[tokio::test]
    async fn test_restock_is_additive() {
        let (db, config) = setup().await;
        let latas = add_product(&db, &config, "Latas de bebida", 900, 4).await;

        let first = commit_single(&db, &config, &SingleCommand::restock(50, "latas"))
            .await
            .unwrap();
        assert_eq!(first.amount, 0);
        assert_eq!(
            first.message.as_deref(),
            Some("Repuestos 50 Latas de bebida. Nuevo stock: 54.")
        );

        commit_single(&db, &config, &SingleCommand::restock(50, "latas"))
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &latas.id).await, 104);

        let rows = ledger(&db, &config).await;
        assert_eq!(rows.len(), 2);
        assert!(rows
            .iter()
            .all(|r| r.kind == TransactionType::InventoryIn && r.amount == 0 && r.quantity == 50));
    }

    #[tokio::test]
    async fn test_restock_falls_back_to_resolver() {
        let (db, config) = setup().await;
        let pulsera = add_product(&db, &config, "Pulsera", 1500, 1).await;

        commit_single(&db, &config, &SingleCommand::restock(10, "pulseras"))
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &pulsera.id).await, 11);

        let err = commit_single(&db, &config, &SingleCommand::restock(10, "anillos"))
            .await
            .unwrap_err();
        assert_eq!(err.message, "No encontré el producto \"anillos\".");
    }

    #[tokio::test]
    async fn test_commits_are_scoped_by_merchant() {
        let (db, config) = setup().await;
        let other = ConfigState {
            merchant_id: "someone-else".to_string(),
            ..ConfigState::default()
        };
        add_product(&db, &other, "Pulsera", 1500, 10).await;

        let err = commit_single(&db, &config, &SingleCommand::sale(1, "pulsera", true))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    // -------------------------------------------------------------------------
    // Multi-item commit
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_multi_item_records_group() {
        let (db, config) = setup().await;
        let dubai = add_product(&db, &config, "Dubai", 1500, 5).await;
        let macizo = add_product(&db, &config, "Macizo", 800, 10).await;

        let outcome = commit_multi_item(
            &db,
            &config,
            &[line(1, "dubai", true), line(3, "macizos", true)],
        )
        .await
        .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.amount, Some(1500 + 2400));
        assert_eq!(outcome.message, "Venta de 2 productos registrada.");
        assert!(outcome.failed_items.is_empty());
        assert_eq!(stock_of(&db, &dubai.id).await, 4);
        assert_eq!(stock_of(&db, &macizo.id).await, 7);

        let rows = ledger(&db, &config).await;
        let group = rows[0].group_id.clone().unwrap();
        assert!(rows.iter().all(|r| r.group_id.as_deref() == Some(group.as_str())));
    }

    #[tokio::test]
    async fn test_multi_item_batch_is_atomic() {
        let (db, config) = setup().await;
        let pulsera = add_product(&db, &config, "Pulsera", 1500, 10).await;
        let dubai = add_product(&db, &config, "Dubai", 1500, 1).await;
        let aros = add_product(&db, &config, "Aros", 2500, 10).await;

        let err = commit_multi_item(
            &db,
            &config,
            &[line(2, "pulseras", true), line(3, "dubai", true), line(1, "aros", true)],
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("Dubai"));
        assert_eq!(stock_of(&db, &pulsera.id).await, 10);
        assert_eq!(stock_of(&db, &dubai.id).await, 1);
        assert_eq!(stock_of(&db, &aros.id).await, 10);
        assert!(ledger(&db, &config).await.is_empty());
    }

    #[tokio::test]
    async fn test_multi_item_reports_unmatched_lines() {
        let (db, config) = setup().await;
        add_product(&db, &config, "Dubai", 1500, 5).await;

        let outcome = commit_multi_item(
            &db,
            &config,
            &[line(1, "dubai", true), line(2, "alfajores", true), line(1000, "propina", false)],
        )
        .await
        .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.amount, Some(2500));
        assert_eq!(outcome.message, "Venta de 2 productos registrada.");
        assert_eq!(outcome.failed_items, vec!["alfajores".to_string()]);

        let rows = ledger(&db, &config).await;
        let propina = rows.iter().find(|r| r.description == "propina").unwrap();
        assert_eq!(propina.product_id, None);
    }

    #[tokio::test]
    async fn test_multi_item_nothing_identified_is_soft() {
        let (db, config) = setup().await;

        let outcome = commit_multi_item(
            &db,
            &config,
            &[line(1, "alfajores", true), line(2, "chicles", true)],
        )
        .await
        .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.amount, None);
        assert_eq!(outcome.message, NOTHING_IDENTIFIED);
        assert_eq!(outcome.failed_items.len(), 2);
        assert!(ledger(&db, &config).await.is_empty());
    }

    #[tokio::test]
    async fn test_multi_item_single_line_message() {
        let (db, config) = setup().await;
        add_product(&db, &config, "Dubai", 1500, 5).await;

        let outcome = commit_multi_item(&db, &config, &[line(1, "dubai", true), line(1, "nada", true)])
            .await
            .unwrap();
        assert_eq!(outcome.message, "Venta de 1 producto registrada.");
    }

    #[tokio::test]
    async fn test_multi_item_oversized_amounts_are_rejected() {
        let (db, config) = setup().await;
        let oro = add_product(&db, &config, "Oro", 9_000_000_000_000_000_000, 5).await;
        add_product(&db, &config, "Plata", 9_000_000_000_000_000_000, 5).await;

        let err = commit_multi_item(
            &db,
            &config,
            &[
                line(9_000_000_000_000_000_000, "", false),
                line(9_000_000_000_000_000_000, "", false),
            ],
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = commit_multi_item(&db, &config, &[line(1, "oro", true), line(1, "plata", true)])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(stock_of(&db, &oro.id).await, 5);
        assert!(ledger(&db, &config).await.is_empty());
    }

    // -------------------------------------------------------------------------
    // Cart checkout
    // -------------------------------------------------------------------------

    fn checkout_line(product: &Product, quantity: i64) -> CheckoutLine {
        CheckoutLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_checkout_writes_one_row_per_line() {
        let (db, config) = setup().await;
        let cola = add_product(&db, &config, "Bebida", 900, 10).await;
        let pan = add_product(&db, &config, "Pan", 200, 20).await;
        let lines = vec![checkout_line(&cola, 2), checkout_line(&pan, 5)];

        let outcome = commit_cart_checkout(&db, &config, &lines, 2800, "debit")
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.total, 2800);
        assert_eq!(outcome.lines, 2);
        assert_eq!(stock_of(&db, &cola.id).await, 8);
        assert_eq!(stock_of(&db, &pan.id).await, 15);

        let rows = db.inner().transactions().list_by_group(&outcome.group_id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].description, "Venta POS: 2x Bebida");
        assert!(rows.iter().all(|r| r.payment_method.as_deref() == Some("DEBIT")));
    }

    #[tokio::test]
    async fn test_checkout_is_all_or_nothing() {
        let (db, config) = setup().await;
        let cola = add_product(&db, &config, "Bebida", 900, 10).await;
        let pan = add_product(&db, &config, "Pan", 200, 1).await;
        let lines = vec![checkout_line(&cola, 2), checkout_line(&pan, 3)];

        let err = commit_cart_checkout(&db, &config, &lines, 2400, "")
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.message, "Stock insuficiente para Pan. Disponibles: 1");
        assert_eq!(stock_of(&db, &cola.id).await, 10);
        assert_eq!(stock_of(&db, &pan.id).await, 1);
        assert!(ledger(&db, &config).await.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_rejects_empty_and_missing() {
        let (db, config) = setup().await;

        let err = commit_cart_checkout(&db, &config, &[], 0, "CASH").await.unwrap_err();
        assert_eq!(err.message, "El carrito está vacío");

        let ghost = CheckoutLine {
            product_id: "gone".to_string(),
            name: "Fantasma".to_string(),
            unit_price: 100,
            quantity: 1,
        };
        let err = commit_cart_checkout(&db, &config, &[ghost], 100, "CASH")
            .await
            .unwrap_err();
        assert_eq!(err.message, "Producto no encontrado: Fantasma");
    }

    #[tokio::test]
    async fn test_checkout_uses_line_sum_over_shown_total() {
        let (db, config) = setup().await;
        let cola = add_product(&db, &config, "Bebida", 900, 10).await;

        let outcome = commit_cart_checkout(&db, &config, &[checkout_line(&cola, 1)], 1, "CASH")
            .await
            .unwrap();
        assert_eq!(outcome.total, 900);
    }

    #[tokio::test]
    async fn test_checkout_cannot_sell_another_merchants_product() {
        let (db, config) = setup().await;
        let other = ConfigState {
            merchant_id: "someone-else".to_string(),
            ..ConfigState::default()
        };
        let foreign = add_product(&db, &other, "Bebida", 900, 10).await;

        let err = commit_cart_checkout(&db, &config, &[checkout_line(&foreign, 2)], 1800, "CASH")
            .await
            .unwrap_err();
        assert_eq!(err.message, "Producto no encontrado: Bebida");

        let stored = db
            .inner()
            .products()
            .get_by_id(&other.merchant_id, &foreign.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.stock, 10);
    }

    #[tokio::test]
    async fn test_checkout_line_overflow_is_rejected() {
        let (db, config) = setup().await;
        let oro = add_product(&db, &config, "Oro", 9_000_000_000_000_000_000, 10).await;

        let err = commit_cart_checkout(&db, &config, &[checkout_line(&oro, 2)], 0, "CASH")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(stock_of(&db, &oro.id).await, 10);
        assert!(ledger(&db, &config).await.is_empty());
    }

    // -------------------------------------------------------------------------
    // Ledger
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_list_by_range_covers_today() {
        let (db, config) = setup().await;
        commit_single(&db, &config, &SingleCommand::expense(1000, "luz"))
            .await
            .unwrap();

        let today = Utc::now()
            .with_timezone(&config.utc_offset())
            .date_naive()
            .format("%Y-%m-%d")
            .to_string();

        let rows = list_transactions_by_range(&db, &config, &today, &today).await.unwrap();
        assert_eq!(rows.len(), 1);

        let err = list_transactions_by_range(&db, &config, "2024-05-02", "2024-05-01")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = list_transactions_by_range(&db, &config, "ayer", &today).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_delete_transaction() {
        let (db, config) = setup().await;
        commit_single(&db, &config, &SingleCommand::expense(1000, "luz"))
            .await
            .unwrap();
        let id = ledger(&db, &config).await[0].id.clone();

        delete_transaction(&db, &config, &id).await.unwrap();
        assert!(ledger(&db, &config).await.is_empty());

        let err = delete_transaction(&db, &config, &id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
