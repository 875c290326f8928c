//! # Report Commands
//!
//! Dashboard numbers and the insight panels. These commands only read: they
//! fetch ledger rows or the catalog and hand them to `emprende_core::insights`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  dashboard_metrics   today's sales/expenses, stock value, inventory    │
//! │  sales_insights      all SALE rows     → top products, peak hours      │
//! │  expense_insights    all EXPENSE rows  → categories, monthly average   │
//! │  inventory_insights  catalog           → value, low stock              │
//! │  risk_alert          catalog + this month's totals → one alert         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiResult;
use crate::state::{ConfigState, DbState};
use emprende_core::insights::{
    self, saturating_sum, start_of_local_day, start_of_local_month, ExpenseInsights,
    InventoryInsights, RiskAlert, SalesInsights,
};
use emprende_core::{Product, Transaction, TransactionType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub sales_today: i64,
    pub expenses_today: i64,
    /// Σ price × max(0, stock)
    pub total_stock_value: i64,
    /// Newest first.
    pub transactions_today: Vec<Transaction>,
    /// Sorted by name.
    pub inventory: Vec<Product>,
}

/// Today's numbers, where "today" starts at local midnight.
pub async fn dashboard_metrics(
    db: &DbState,
    config: &ConfigState,
    now: DateTime<Utc>,
) -> ApiResult<DashboardMetrics> {
    debug!("dashboard_metrics command");
    let merchant_id = config.merchant_id.as_str();
    let since = start_of_local_day(now, config.utc_offset());

    let transactions = db.inner().transactions();
    let sales_today = transactions
        .sum_by_type_since(merchant_id, TransactionType::Sale, since)
        .await?;
    let expenses_today = transactions
        .sum_by_type_since(merchant_id, TransactionType::Expense, since)
        .await?;
    let transactions_today = transactions
        .list_by_range(merchant_id, since, now + chrono::Duration::seconds(1))
        .await?;

    let mut inventory = db.inner().products().list_for_merchant(merchant_id).await?;
    inventory.sort_by(|a, b| a.name.cmp(&b.name));
    let total_stock_value = saturating_sum(inventory.iter().map(Product::stock_value));

    Ok(DashboardMetrics {
        sales_today,
        expenses_today,
        total_stock_value,
        transactions_today,
        inventory,
    })
}

pub async fn sales_insights(db: &DbState, config: &ConfigState) -> ApiResult<SalesInsights> {
    debug!("sales_insights command");
    let sales = db
        .inner()
        .transactions()
        .list_by_type(&config.merchant_id, TransactionType::Sale)
        .await?;
    Ok(insights::sales_insights(&sales, config.utc_offset()))
}

pub async fn expense_insights(db: &DbState, config: &ConfigState) -> ApiResult<ExpenseInsights> {
    debug!("expense_insights command");
    let expenses = db
        .inner()
        .transactions()
        .list_by_type(&config.merchant_id, TransactionType::Expense)
        .await?;
    Ok(insights::expense_insights(&expenses, config.utc_offset()))
}

pub async fn inventory_insights(
    db: &DbState,
    config: &ConfigState,
) -> ApiResult<InventoryInsights> {
    debug!("inventory_insights command");
    let products = db.inner().products().list_for_merchant(&config.merchant_id).await?;
    Ok(insights::inventory_insights(&products))
}

/// The most urgent alert not in `dismissed`, judged on this local month.
pub async fn risk_alert(
    db: &DbState,
    config: &ConfigState,
    now: DateTime<Utc>,
    dismissed: &[String],
) -> ApiResult<Option<RiskAlert>> {
    debug!(dismissed = dismissed.len(), "risk_alert command");
    let merchant_id = config.merchant_id.as_str();
    let month_start = start_of_local_month(now, config.utc_offset());

    let products = db.inner().products().list_for_merchant(merchant_id).await?;
    let transactions = db.inner().transactions();
    let income = transactions
        .sum_by_type_since(merchant_id, TransactionType::Sale, month_start)
        .await?;
    let outgo = transactions
        .sum_by_type_since(merchant_id, TransactionType::Expense, month_start)
        .await?;

    Ok(insights::risk_analysis(&products, income, outgo, dismissed))
}
