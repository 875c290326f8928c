//! # Insight Aggregators
//!
//! Read-side analytics over ledger rows and the catalog. Nothing here
//! mutates; callers fetch the records and pass them in.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SALE rows     ──► sales_insights     (top products, peak hours, ticket)│
//! │  EXPENSE rows  ──► expense_insights   (categories, monthly avg, advice) │
//! │  Products      ──► inventory_insights (value, low stock, advice)        │
//! │  Products + month totals + dismissed ids ──► risk_analysis              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Hour and month bucketing happen in the merchant's local time, given as
//! an explicit [`FixedOffset`].

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Product, Transaction};

const TOP_PRODUCTS: usize = 5;
const TOP_HOURS: usize = 3;
const TOP_CATEGORIES: usize = 5;
const TOP_INVENTORY: usize = 5;

/// Share of total spend above which one category is flagged (percent).
const DEPENDENCY_ALERT_PERCENT: i64 = 40;

// =============================================================================
// Sales
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopProduct {
    pub name: String,
    pub quantity: i64,
    pub revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PeakHour {
    /// "14:00"
    pub hour: String,
    pub count: usize,
    /// count / number of sales rows
    pub intensity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesInsights {
    pub total_revenue: i64,
    /// Distinct tickets: one per group id, or per row when ungrouped.
    pub total_transactions: usize,
    pub top_products: Vec<TopProduct>,
    pub peak_hours: Vec<PeakHour>,
    pub average_ticket: i64,
}

/// Aggregates SALE rows.
///
/// Products are keyed by product id, else description, else "Otros".
/// Ties keep first-seen order.
pub fn sales_insights(sales: &[Transaction], offset: FixedOffset) -> SalesInsights {
    if sales.is_empty() {
        return SalesInsights::default();
    }

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut products: Vec<TopProduct> = Vec::new();
    let mut hours = [0usize; 24];
    let mut tickets: HashSet<&str> = HashSet::new();
    let mut total_revenue = 0i64;

    for sale in sales {
        let key = sale
            .product_id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| Some(sale.description.clone()).filter(|d| !d.is_empty()))
            .unwrap_or_else(|| "Otros".to_string());

        let slot = *index.entry(key).or_insert_with(|| {
            products.push(TopProduct {
                name: if sale.description.is_empty() {
                    "Producto Desconocido".to_string()
                } else {
                    sale.description.clone()
                },
                quantity: 0,
                revenue: 0,
            });
            products.len() - 1
        });
        let entry = &mut products[slot];
        entry.quantity = entry.quantity.saturating_add(sale.quantity.max(1));
        entry.revenue = entry.revenue.saturating_add(sale.amount);

        let hour = sale.created_at.with_timezone(&offset).hour() as usize;
        hours[hour] += 1;

        tickets.insert(sale.group_id.as_deref().unwrap_or(sale.id.as_str()));
        total_revenue = total_revenue.saturating_add(sale.amount);
    }

    products.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    products.truncate(TOP_PRODUCTS);

    let mut ranked: Vec<(usize, usize)> = hours.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let peak_hours = ranked
        .into_iter()
        .take(TOP_HOURS)
        .filter(|(_, count)| *count > 0)
        .map(|(hour, count)| PeakHour {
            hour: format!("{}:00", hour),
            count,
            intensity: count as f64 / sales.len() as f64,
        })
        .collect();

    let total_transactions = tickets.len();
    let average_ticket = if total_transactions > 0 {
        (total_revenue as f64 / total_transactions as f64).round() as i64
    } else {
        0
    };

    SalesInsights {
        total_revenue,
        total_transactions,
        top_products: products,
        peak_hours,
        average_ticket,
    }
}

// =============================================================================
// Expenses
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExpenseCategory {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExpenseInsights {
    pub total_expenses: i64,
    pub average_monthly: i64,
    pub top_categories: Vec<ExpenseCategory>,
    pub advice: String,
    pub history_count: usize,
}

/// Aggregates EXPENSE rows by upper-cased description.
pub fn expense_insights(expenses: &[Transaction], offset: FixedOffset) -> ExpenseInsights {
    let total_expenses = saturating_sum(expenses.iter().map(|e| e.amount));

    let months: HashSet<(i32, u32)> = expenses
        .iter()
        .map(|e| {
            let local = e.created_at.with_timezone(&offset);
            (local.year(), local.month())
        })
        .collect();
    let average_monthly = if months.is_empty() {
        total_expenses
    } else {
        (total_expenses as f64 / months.len() as f64).round() as i64
    };

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut categories: Vec<ExpenseCategory> = Vec::new();
    for expense in expenses {
        let trimmed = expense.description.trim();
        let name = if trimmed.is_empty() {
            "VARIOS".to_string()
        } else {
            trimmed.to_uppercase()
        };
        let slot = *index.entry(name.clone()).or_insert_with(|| {
            categories.push(ExpenseCategory { name, value: 0 });
            categories.len() - 1
        });
        categories[slot].value = categories[slot].value.saturating_add(expense.amount);
    }
    categories.sort_by(|a, b| b.value.cmp(&a.value));
    categories.truncate(TOP_CATEGORIES);

    let advice = expense_advice(&categories, total_expenses, months.len());

    ExpenseInsights {
        total_expenses,
        average_monthly,
        top_categories: categories,
        advice,
        history_count: expenses.len(),
    }
}

fn expense_advice(categories: &[ExpenseCategory], total: i64, months: usize) -> String {
    let Some(top) = categories.first() else {
        return "Consejo: Registra cada gasto, por pequeño que sea. Los 'gastos hormiga' suman."
            .to_string();
    };

    let percent = if total > 0 {
        (top.value as f64 * 100.0 / total as f64).round() as i64
    } else {
        0
    };

    if percent > DEPENDENCY_ALERT_PERCENT {
        format!(
            "Alerta: El {}% de tu dinero se va en \"{}\". Es una dependencia riesgosa, busca proveedores alternativos.",
            percent, top.name
        )
    } else if months > 1 {
        format!(
            "Tu estructura de costos parece estable. Tu mayor ítem es \"{}\" ({}%). ¿Es un costo fijo o puedes negociarlo?",
            top.name, percent
        )
    } else {
        format!(
            "Ojo con \"{}\". Representa tu mayor salida de caja hoy ({}).",
            top.name,
            Money::from_pesos(top.value)
        )
    }
}

// =============================================================================
// Inventory
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryInsights {
    /// Σ price × stock
    pub total_value: i64,
    /// Σ cost × stock
    pub total_cost: i64,
    pub potential_profit: i64,
    pub low_stock_items: Vec<Product>,
    pub top_valued_items: Vec<Product>,
    pub advice: String,
    pub total_items: usize,
}

pub fn inventory_insights(products: &[Product]) -> InventoryInsights {
    let total_value = saturating_sum(products.iter().map(Product::stock_value));
    let total_cost = saturating_sum(products.iter().map(|p| p.cost.saturating_mul(p.stock.max(0))));
    let potential_profit = total_value.saturating_sub(total_cost);

    let mut by_stock: Vec<&Product> = products.iter().collect();
    by_stock.sort_by_key(|p| p.stock);
    let low_stock_items: Vec<Product> = by_stock
        .into_iter()
        .filter(|p| p.is_low_stock())
        .take(TOP_INVENTORY)
        .cloned()
        .collect();

    let mut by_value: Vec<&Product> = products.iter().collect();
    by_value.sort_by(|a, b| b.stock_value().cmp(&a.stock_value()));
    let top_valued_items: Vec<Product> = by_value.into_iter().take(TOP_INVENTORY).cloned().collect();

    let advice = if let Some(critical) = low_stock_items.first() {
        format!(
            "Urgente: Te quedan solo {} unidades de \"{}\". Si es un producto estrella, perderás ventas hoy.",
            critical.stock, critical.name
        )
    } else if products.is_empty() {
        "Consejo: Un inventario parado es dinero perdiendo valor. Revisa qué no se vende hace tiempo."
            .to_string()
    } else if potential_profit > total_cost {
        format!(
            "Excelente salud. Tienes más ganancia proyectada ({}) que costo invertido.",
            Money::from_pesos(potential_profit)
        )
    } else {
        format!(
            "Todo en orden. Tienes {} en mercadería lista para venderse.",
            Money::from_pesos(total_value)
        )
    };

    InventoryInsights {
        total_value,
        total_cost,
        potential_profit,
        low_stock_items,
        top_valued_items,
        advice,
        total_items: products.len(),
    }
}

// =============================================================================
// Risk
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum RiskSeverity {
    Critical,
    Warning,
}

/// Where the merchant should look to act on an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum RiskAction {
    Inventory,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RiskAlert {
    /// Stable id used for dismissal. Stock alerts embed the stock count,
    /// so a dismissed alert comes back once stock changes.
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: RiskSeverity,
    pub action_label: String,
    pub action_type: RiskAction,
    pub stock_count: Option<i64>,
}

/// Picks the most urgent alert the merchant hasn't dismissed.
///
/// ## Priority
/// ```text
/// 1. stock risk      lowest stock at or under min_stock, ties → higher price
/// 2. operating loss  outgo > income > 0
/// 3. thin margin     outgo > 80% of income
/// ```
///
/// `dismissed` is caller-owned state; this function keeps none.
pub fn risk_analysis(
    products: &[Product],
    month_income: i64,
    month_outgo: i64,
    dismissed: &[String],
) -> Option<RiskAlert> {
    let mut candidates = Vec::with_capacity(3);

    let critical = products
        .iter()
        .filter(|p| p.is_low_stock())
        .min_by(|a, b| a.stock.cmp(&b.stock).then(b.price.cmp(&a.price)));
    if let Some(product) = critical {
        candidates.push(stock_alert(product));
    }

    if month_income > 0 && month_outgo > month_income {
        candidates.push(RiskAlert {
            id: "profitability-red".to_string(),
            title: "Pérdida Operativa Detectada".to_string(),
            description: format!(
                "Tus gastos del mes ({}) han superado tus ventas ({}). Estás operando en rojo.",
                Money::from_pesos(month_outgo),
                Money::from_pesos(month_income)
            ),
            severity: RiskSeverity::Critical,
            action_label: "Revisar Gastos Ahora".to_string(),
            action_type: RiskAction::Expense,
            stock_count: None,
        });
    }

    // outgo > 0.8 × income, in integers
    if month_income > 0 && i128::from(month_outgo) * 5 > i128::from(month_income) * 4 {
        candidates.push(RiskAlert {
            id: "margin-warning".to_string(),
            title: "Margen Peligroso".to_string(),
            description: "Cuidado: Tus gastos ya consumieron el 80% de tus ingresos este mes. Te queda poco margen de maniobra."
                .to_string(),
            severity: RiskSeverity::Warning,
            action_label: "Analizar Fugas".to_string(),
            action_type: RiskAction::Expense,
            stock_count: None,
        });
    }

    candidates
        .into_iter()
        .find(|alert| !dismissed.iter().any(|d| d == &alert.id))
}

fn stock_alert(product: &Product) -> RiskAlert {
    let sold_out = product.stock <= 0;
    RiskAlert {
        id: format!("inventory-{}-{}", product.id, product.stock),
        title: if sold_out {
            "Stock Agotado".to_string()
        } else {
            "Riesgo de Quiebre de Stock".to_string()
        },
        description: if sold_out {
            format!(
                "Tu producto \"{}\" está en 0. Estás perdiendo ventas cada minuto.",
                product.name
            )
        } else {
            format!(
                "Tu producto \"{}\" está en nivel crítico. Es un activo valioso que no puedes dejar de vender.",
                product.name
            )
        },
        severity: RiskSeverity::Critical,
        action_label: "Reponer Inventario".to_string(),
        action_type: RiskAction::Inventory,
        stock_count: Some(product.stock),
    }
}

// =============================================================================
// Local Time Windows
// =============================================================================

/// Midnight of the local day containing `now`, as UTC.
pub fn start_of_local_day(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local_date = now.with_timezone(&offset).date_naive();
    local_midnight(local_date, offset, now)
}

/// Midnight of the first day of the local month containing `now`, as UTC.
pub fn start_of_local_month(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local_date = now.with_timezone(&offset).date_naive();
    let first = local_date.with_day(1).unwrap_or(local_date);
    local_midnight(first, offset, now)
}

fn local_midnight(
    date: chrono::NaiveDate,
    offset: FixedOffset,
    fallback: DateTime<Utc>,
) -> DateTime<Utc> {
    offset
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(fallback)
}

/// Read-side totals saturate instead of failing: a report over a huge
/// ledger still renders.
pub fn saturating_sum(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionType;

    fn utc_minus_3() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn row(
        id: &str,
        kind: TransactionType,
        amount: i64,
        quantity: i64,
        description: &str,
        product_id: Option<&str>,
        group_id: Option<&str>,
        created_at: &str,
    ) -> Transaction {
        Transaction {
            id: id.to_string(),
            merchant_id: "m-1".to_string(),
            kind,
            amount,
            quantity,
            description: description.to_string(),
            product_id: product_id.map(str::to_string),
            group_id: group_id.map(str::to_string),
            payment_method: None,
            created_at: at(created_at),
        }
    }

    fn product(id: &str, name: &str, price: i64, cost: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            merchant_id: "m-1".to_string(),
            name: name.to_string(),
            price,
            cost,
            stock,
            min_stock: 5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_sales_insights_groups_tickets_and_products() {
        let sales = vec![
            row("t1", TransactionType::Sale, 3000, 2, "Pulsera", Some("p1"), Some("g1"), "2024-05-10T17:15:00Z"),
            row("t2", TransactionType::Sale, 1500, 1, "Dubai", Some("p2"), Some("g1"), "2024-05-10T17:15:00Z"),
            row("t3", TransactionType::Sale, 4500, 3, "Pulsera", Some("p1"), None, "2024-05-10T20:40:00Z"),
            row("t4", TransactionType::Sale, 5000, 1, "", None, None, "2024-05-11T17:05:00Z"),
        ];

        let insights = sales_insights(&sales, utc_minus_3());
        assert_eq!(insights.total_revenue, 14000);
        assert_eq!(insights.total_transactions, 3);
        assert_eq!(insights.average_ticket, 4667);

        assert_eq!(insights.top_products[0].name, "Pulsera");
        assert_eq!(insights.top_products[0].quantity, 5);
        assert_eq!(insights.top_products[0].revenue, 7500);
        assert!(insights
            .top_products
            .iter()
            .any(|p| p.name == "Producto Desconocido"));

        // 17:xx UTC is 14:xx at UTC-3
        assert_eq!(insights.peak_hours[0].hour, "14:00");
        assert_eq!(insights.peak_hours[0].count, 3);
        assert!((insights.peak_hours[0].intensity - 0.75).abs() < f64::EPSILON);
        assert_eq!(insights.peak_hours.len(), 2);
    }

    #[test]
    fn test_sales_insights_empty() {
        assert_eq!(sales_insights(&[], utc_minus_3()), SalesInsights::default());
    }

    #[test]
    fn test_expense_insights_dependency_alert() {
        let expenses = vec![
            row("e1", TransactionType::Expense, 8000, 1, "harina ", None, None, "2024-05-02T12:00:00Z"),
            row("e2", TransactionType::Expense, 2000, 1, "Harina", None, None, "2024-05-03T12:00:00Z"),
            row("e3", TransactionType::Expense, 1000, 1, "", None, None, "2024-05-04T12:00:00Z"),
        ];

        let insights = expense_insights(&expenses, utc_minus_3());
        assert_eq!(insights.total_expenses, 11000);
        assert_eq!(insights.average_monthly, 11000);
        assert_eq!(insights.top_categories[0].name, "HARINA");
        assert_eq!(insights.top_categories[0].value, 10000);
        assert_eq!(insights.top_categories[1].name, "VARIOS");
        assert!(insights.advice.starts_with("Alerta: El 91%"));
        assert_eq!(insights.history_count, 3);
    }

    #[test]
    fn test_expense_insights_monthly_average_and_advice() {
        let expenses = vec![
            row("e1", TransactionType::Expense, 4000, 1, "Arriendo", None, None, "2024-04-15T12:00:00Z"),
            row("e2", TransactionType::Expense, 3000, 1, "Luz", None, None, "2024-05-15T12:00:00Z"),
            row("e3", TransactionType::Expense, 3000, 1, "Gas", None, None, "2024-05-16T12:00:00Z"),
        ];

        let insights = expense_insights(&expenses, utc_minus_3());
        assert_eq!(insights.average_monthly, 5000);
        assert!(insights.advice.contains("estable"));
        assert!(insights.advice.contains("ARRIENDO"));
    }

    #[test]
    fn test_expense_insights_without_data() {
        let insights = expense_insights(&[], utc_minus_3());
        assert_eq!(insights.total_expenses, 0);
        assert!(insights.top_categories.is_empty());
        assert!(insights.advice.starts_with("Consejo"));
    }

    #[test]
    fn test_inventory_totals_saturate() {
        let products = vec![
            product("1", "Oro", 9_000_000_000_000_000_000, 0, 5),
            product("2", "Plata", 9_000_000_000_000_000_000, 0, 5),
        ];

        let insights = inventory_insights(&products);
        assert_eq!(insights.total_value, i64::MAX);
        assert_eq!(insights.potential_profit, i64::MAX);
    }

    #[test]
    fn test_inventory_insights() {
        let products = vec![
            product("1", "Pulsera", 1000, 400, 20),
            product("2", "Dubai", 1500, 600, 2),
            product("3", "Anillo", 5000, 2000, 10),
        ];

        let insights = inventory_insights(&products);
        assert_eq!(insights.total_value, 20000 + 3000 + 50000);
        assert_eq!(insights.total_cost, 8000 + 1200 + 20000);
        assert_eq!(insights.potential_profit, 73000 - 29200);
        assert_eq!(insights.low_stock_items.len(), 1);
        assert_eq!(insights.low_stock_items[0].name, "Dubai");
        assert_eq!(insights.top_valued_items[0].name, "Anillo");
        assert!(insights.advice.contains("Te quedan solo 2 unidades de \"Dubai\""));
        assert_eq!(insights.total_items, 3);
    }

    #[test]
    fn test_risk_prefers_lowest_stock_then_price() {
        let products = vec![
            product("1", "Pulsera", 1000, 0, 0),
            product("2", "Anillo", 5000, 0, 0),
            product("3", "Dubai", 1500, 0, 3),
        ];

        let alert = risk_analysis(&products, 0, 0, &[]).unwrap();
        assert_eq!(alert.id, "inventory-2-0");
        assert_eq!(alert.title, "Stock Agotado");
        assert_eq!(alert.stock_count, Some(0));
        assert_eq!(alert.action_type, RiskAction::Inventory);
    }

    #[test]
    fn test_risk_dismissed_falls_through() {
        let products = vec![product("1", "Pulsera", 1000, 0, 2)];

        let dismissed = vec!["inventory-1-2".to_string()];
        let alert = risk_analysis(&products, 10000, 12000, &dismissed).unwrap();
        assert_eq!(alert.id, "profitability-red");

        let dismissed = vec!["inventory-1-2".to_string(), "profitability-red".to_string()];
        let alert = risk_analysis(&products, 10000, 12000, &dismissed).unwrap();
        assert_eq!(alert.id, "margin-warning");
        assert_eq!(alert.severity, RiskSeverity::Warning);
    }

    #[test]
    fn test_risk_margin_warning_threshold() {
        assert!(risk_analysis(&[], 10000, 8000, &[]).is_none());
        let alert = risk_analysis(&[], 10000, 8001, &[]).unwrap();
        assert_eq!(alert.id, "margin-warning");
        assert!(risk_analysis(&[], 0, 5000, &[]).is_none());
    }

    #[test]
    fn test_local_windows() {
        let now = at("2024-05-01T02:00:00Z"); // still April 30 at UTC-3
        assert_eq!(
            start_of_local_day(now, utc_minus_3()),
            at("2024-04-30T03:00:00Z")
        );
        assert_eq!(
            start_of_local_month(now, utc_minus_3()),
            at("2024-04-01T03:00:00Z")
        );
    }
}
