//! # Unit of Work
//!
//! Groups the reads and writes of one business operation into a single
//! SQLite transaction.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  let mut uow = db.begin().await?;        BEGIN                         │
//! │       │                                                                 │
//! │       ├── uow.products_for_merchant(..)  read the catalog               │
//! │       ├── uow.decrement_stock(..)        guarded UPDATE                 │
//! │       ├── uow.record(..)                 INSERT ledger row              │
//! │       ├── uow.record_many(..)            INSERT one row per line        │
//! │       │                                                                 │
//! │       ├── Ok  ──► uow.commit().await?    COMMIT                        │
//! │       └── Err ──► drop(uow)              ROLLBACK (automatic)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads go through the same connection as the writes, so a pool with a
//! single connection (in-memory tests) never waits on itself.

use sqlx::Sqlite;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{product, transaction};
use emprende_core::{NewTransaction, Product, ProductUpdate, Transaction};

/// One open SQLite transaction.
pub struct UnitOfWork {
    tx: sqlx::Transaction<'static, Sqlite>,
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork").finish_non_exhaustive()
    }
}

impl UnitOfWork {
    pub(crate) fn new(tx: sqlx::Transaction<'static, Sqlite>) -> Self {
        UnitOfWork { tx }
    }

    pub async fn products_for_merchant(&mut self, merchant_id: &str) -> DbResult<Vec<Product>> {
        product::fetch_for_merchant(&mut *self.tx, merchant_id).await
    }

    pub async fn product_by_id(
        &mut self,
        merchant_id: &str,
        id: &str,
    ) -> DbResult<Option<Product>> {
        product::fetch_by_id(&mut *self.tx, merchant_id, id).await
    }

    pub async fn find_product_containing(
        &mut self,
        merchant_id: &str,
        fragment: &str,
    ) -> DbResult<Option<Product>> {
        product::fetch_first_containing(&mut *self.tx, merchant_id, fragment).await
    }

    pub async fn update_product(&mut self, merchant_id: &str, update: &ProductUpdate) -> DbResult<()> {
        product::apply_update(&mut *self.tx, merchant_id, update).await
    }

    pub async fn increment_stock(
        &mut self,
        merchant_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        product::increment_stock(&mut *self.tx, merchant_id, product_id, quantity).await
    }

    /// Guarded decrement.
    ///
    /// ## Returns
    /// * `Err(DbError::StockConflict)` - fewer than `quantity` units remain
    ///   (or the merchant has no such product); the caller should drop the
    ///   unit of work
    pub async fn decrement_stock(
        &mut self,
        merchant_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        if product::decrement_stock_if_available(&mut *self.tx, merchant_id, product_id, quantity)
            .await?
        {
            Ok(())
        } else {
            Err(DbError::stock_conflict(product_id, quantity))
        }
    }

    /// Records one ledger row.
    pub async fn record(
        &mut self,
        merchant_id: &str,
        new: &NewTransaction,
    ) -> DbResult<Transaction> {
        transaction::insert_transaction(&mut *self.tx, merchant_id, new).await
    }

    /// Records several ledger rows in order. Nothing is visible outside
    /// until [`commit`](Self::commit).
    pub async fn record_many(
        &mut self,
        merchant_id: &str,
        rows: &[NewTransaction],
    ) -> DbResult<Vec<Transaction>> {
        let mut recorded = Vec::with_capacity(rows.len());
        for row in rows {
            recorded.push(transaction::insert_transaction(&mut *self.tx, merchant_id, row).await?);
        }
        debug!(rows = recorded.len(), "Recorded ledger rows");
        Ok(recorded)
    }

    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Unit of work committed");
        Ok(())
    }

    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Unit of work rolled back");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use emprende_core::NewProduct;

    const MERCHANT: &str = "m-1";

    #[tokio::test]
    async fn test_commit_persists_stock_and_row() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(MERCHANT, &NewProduct::new("Dubai", 1500, 5))
            .await
            .unwrap();

        let mut uow = db.begin().await.unwrap();
        uow.decrement_stock(MERCHANT, &product.id, 2).await.unwrap();
        uow.record(MERCHANT, &NewTransaction::quantity_sale(&product, 2, None).unwrap())
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let stored = db.products().get_by_id(MERCHANT, &product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 3);
    }

    #[tokio::test]
    async fn test_drop_rolls_back_everything() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(MERCHANT, &NewProduct::new("Dubai", 1500, 5))
            .await
            .unwrap();

        {
            let mut uow = db.begin().await.unwrap();
            uow.decrement_stock(MERCHANT, &product.id, 4).await.unwrap();
            uow.record(MERCHANT, &NewTransaction::quantity_sale(&product, 4, Some("g-1")).unwrap())
                .await
                .unwrap();

            let conflict = uow.decrement_stock(MERCHANT, &product.id, 4).await;
            assert!(matches!(conflict, Err(DbError::StockConflict { .. })));
        }

        let stored = db.products().get_by_id(MERCHANT, &product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 5);
        assert!(db.transactions().list_by_group("g-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_many_shares_the_transaction() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let rows = vec![
            NewTransaction::cash_sale(1000, "Propina", Some("g-1")),
            NewTransaction::cash_sale(2000, "Venta General", Some("g-1")),
        ];

        {
            let mut uow = db.begin().await.unwrap();
            let recorded = uow.record_many(MERCHANT, &rows).await.unwrap();
            assert_eq!(recorded.len(), 2);
        }
        assert!(db.transactions().list_by_group("g-1").await.unwrap().is_empty());

        let mut uow = db.begin().await.unwrap();
        uow.record_many(MERCHANT, &rows).await.unwrap();
        uow.commit().await.unwrap();

        let group = db.transactions().list_by_group("g-1").await.unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group[0].description, "Propina");
    }

    #[tokio::test]
    async fn test_reads_see_own_writes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(MERCHANT, &NewProduct::new("Latas", 900, 0))
            .await
            .unwrap();

        let mut uow = db.begin().await.unwrap();
        uow.increment_stock(MERCHANT, &product.id, 50).await.unwrap();
        let seen = uow.product_by_id(MERCHANT, &product.id).await.unwrap().unwrap();
        assert_eq!(seen.stock, 50);
        uow.rollback().await.unwrap();

        let stored = db.products().get_by_id(MERCHANT, &product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 0);
    }
}
