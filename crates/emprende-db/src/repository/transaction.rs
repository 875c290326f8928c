//! # Transaction Repository
//!
//! The ledger: every sale, expense and stock-in is one immutable row.
//!
//! ## Row Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  kind          amount          quantity   product_id   group_id        │
//! │  ────────────  ──────────────  ─────────  ───────────  ─────────────   │
//! │  SALE          price × qty     qty        set          multi/POS only  │
//! │  SALE (cash)   stated pesos    1          NULL         multi only      │
//! │  EXPENSE       stated pesos    1          NULL         NULL            │
//! │  INVENTORY_IN  0               delta      set          NULL            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use emprende_core::{NewTransaction, Transaction, TransactionType};

/// Repository for ledger operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Records one ledger row.
    pub async fn insert(&self, merchant_id: &str, new: &NewTransaction) -> DbResult<Transaction> {
        insert_transaction(&self.pool, merchant_id, new).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, merchant_id, kind, amount, quantity, description,
                   product_id, group_id, payment_method, created_at
            FROM transactions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Deletes one ledger row. Stock is not restored.
    pub async fn delete(&self, merchant_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting transaction");

        let result = sqlx::query("DELETE FROM transactions WHERE id = ?1 AND merchant_id = ?2")
            .bind(id)
            .bind(merchant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transaction", id));
        }

        Ok(())
    }

    /// Rows with `from <= created_at < to`, newest first.
    pub async fn list_by_range(
        &self,
        merchant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, merchant_id, kind, amount, quantity, description,
                   product_id, group_id, payment_method, created_at
            FROM transactions
            WHERE merchant_id = ?1 AND created_at >= ?2 AND created_at < ?3
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(merchant_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded transactions in range");
        Ok(rows)
    }

    /// Every row of one kind, newest first.
    pub async fn list_by_type(
        &self,
        merchant_id: &str,
        kind: TransactionType,
    ) -> DbResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, merchant_id, kind, amount, quantity, description,
                   product_id, group_id, payment_method, created_at
            FROM transactions
            WHERE merchant_id = ?1 AND kind = ?2
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(merchant_id)
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Rows written by one multi-item sale or POS checkout.
    pub async fn list_by_group(&self, group_id: &str) -> DbResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, merchant_id, kind, amount, quantity, description,
                   product_id, group_id, payment_method, created_at
            FROM transactions
            WHERE group_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Σ amount of one kind since `since` (0 when there are no rows).
    pub async fn sum_by_type_since(
        &self,
        merchant_id: &str,
        kind: TransactionType,
        since: DateTime<Utc>,
    ) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE merchant_id = ?1 AND kind = ?2 AND created_at >= ?3
            "#,
        )
        .bind(merchant_id)
        .bind(kind)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

// =============================================================================
// Statements (shared with UnitOfWork)
// =============================================================================

pub(crate) async fn insert_transaction(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    merchant_id: &str,
    new: &NewTransaction,
) -> DbResult<Transaction> {
    let row = Transaction {
        id: generate_transaction_id(),
        merchant_id: merchant_id.to_string(),
        kind: new.kind,
        amount: new.amount,
        quantity: new.quantity,
        description: new.description.clone(),
        product_id: new.product_id.clone(),
        group_id: new.group_id.clone(),
        payment_method: new.payment_method.clone(),
        created_at: Utc::now(),
    };

    debug!(kind = %row.kind, amount = row.amount, "Recording transaction");

    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, merchant_id, kind, amount, quantity, description,
            product_id, group_id, payment_method, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&row.id)
    .bind(&row.merchant_id)
    .bind(row.kind)
    .bind(row.amount)
    .bind(row.quantity)
    .bind(&row.description)
    .bind(&row.product_id)
    .bind(&row.group_id)
    .bind(&row.payment_method)
    .bind(row.created_at)
    .execute(conn)
    .await?;

    Ok(row)
}

/// Helper to generate a new transaction ID.
pub fn generate_transaction_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Tests
// =============================================================================
