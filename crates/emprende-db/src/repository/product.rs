//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Stock Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read, compute, write back                                   │
//! │     SELECT stock ... ; UPDATE products SET stock = 7 WHERE id = ?      │
//! │                                                                         │
//! │  ✅ CORRECT: delta update, guarded for sales                           │
//! │     UPDATE products SET stock = stock + ?  WHERE id = ?                │
//! │     UPDATE products SET stock = stock - ?  WHERE id = ? AND stock >= ? │
//! │                                                                         │
//! │  Two terminals selling the last unit: exactly one UPDATE matches,      │
//! │  the other sees 0 rows affected and backs out.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every statement that addresses a product by id also filters on
//! `merchant_id`: an id from another merchant reads as missing.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use emprende_core::{NewProduct, Product, ProductUpdate};

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let catalog = repo.list_for_merchant(merchant_id).await?;
/// let product = repo.get_by_id(merchant_id, "uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists a merchant's catalog in creation order.
    ///
    /// Creation order matters: the resolver picks the first fuzzy match.
    pub async fn list_for_merchant(&self, merchant_id: &str) -> DbResult<Vec<Product>> {
        fetch_for_merchant(&self.pool, merchant_id).await
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, merchant_id: &str, id: &str) -> DbResult<Option<Product>> {
        fetch_by_id(&self.pool, merchant_id, id).await
    }

    /// First product (creation order) whose name contains `fragment`,
    /// ASCII case-insensitively.
    pub async fn find_first_containing(
        &self,
        merchant_id: &str,
        fragment: &str,
    ) -> DbResult<Option<Product>> {
        fetch_first_containing(&self.pool, merchant_id, fragment).await
    }

    /// Inserts a new product and returns it with its generated id.
    pub async fn insert(&self, merchant_id: &str, product: &NewProduct) -> DbResult<Product> {
        insert_product(&self.pool, merchant_id, product).await
    }

    /// Applies the field changes of a [`ProductUpdate`]. Stock is not
    /// touched here.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, merchant_id: &str, update: &ProductUpdate) -> DbResult<()> {
        apply_update(&self.pool, merchant_id, update).await
    }

    /// Deletes a product. Ledger rows that referenced it keep their data
    /// and lose the link.
    pub async fn delete(&self, merchant_id: &str, id: &str) -> DbResult<()> {
        delete_product(&self.pool, merchant_id, id).await
    }

    /// Adds `quantity` units to stock.
    pub async fn increment_stock(&self, merchant_id: &str, id: &str, quantity: i64) -> DbResult<()> {
        increment_stock(&self.pool, merchant_id, id, quantity).await
    }

    /// Removes `quantity` units only if that many are on the shelf.
    ///
    /// ## Returns
    /// * `Ok(true)` - Stock decremented
    /// * `Ok(false)` - Not enough stock (or no such product); nothing changed
    pub async fn decrement_stock_if_available(
        &self,
        merchant_id: &str,
        id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        decrement_stock_if_available(&self.pool, merchant_id, id, quantity).await
    }

    /// Counts a merchant's products.
    pub async fn count(&self, merchant_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE merchant_id = ?1")
            .bind(merchant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Statements (shared with UnitOfWork)
// =============================================================================

pub(crate) async fn fetch_for_merchant(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    merchant_id: &str,
) -> DbResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, merchant_id, name, price, cost, stock, min_stock, created_at, updated_at
        FROM products
        WHERE merchant_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(merchant_id)
    .fetch_all(conn)
    .await?;

    debug!(count = products.len(), "Loaded catalog");
    Ok(products)
}

pub(crate) async fn fetch_by_id(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    merchant_id: &str,
    id: &str,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, merchant_id, name, price, cost, stock, min_stock, created_at, updated_at
        FROM products
        WHERE id = ?1 AND merchant_id = ?2
        "#,
    )
    .bind(id)
    .bind(merchant_id)
    .fetch_optional(conn)
    .await?;

    Ok(product)
}

pub(crate) async fn fetch_first_containing(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    merchant_id: &str,
    fragment: &str,
) -> DbResult<Option<Product>> {
    let pattern = format!("%{}%", escape_like(fragment.trim()));

    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, merchant_id, name, price, cost, stock, min_stock, created_at, updated_at
        FROM products
        WHERE merchant_id = ?1 AND name LIKE ?2 ESCAPE '\'
        ORDER BY rowid
        LIMIT 1
        "#,
    )
    .bind(merchant_id)
    .bind(pattern)
    .fetch_optional(conn)
    .await?;

    Ok(product)
}

pub(crate) async fn insert_product(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    merchant_id: &str,
    new: &NewProduct,
) -> DbResult<Product> {
    let now = Utc::now();
    let product = Product {
        id: generate_product_id(),
        merchant_id: merchant_id.to_string(),
        name: new.name.trim().to_string(),
        price: new.price,
        cost: new.cost_or_default(),
        stock: new.stock,
        min_stock: new.min_stock_or_default(),
        created_at: now,
        updated_at: now,
    };

    debug!(name = %product.name, "Inserting product");

    sqlx::query(
        r#"
        INSERT INTO products (
            id, merchant_id, name, price, cost, stock, min_stock, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&product.id)
    .bind(&product.merchant_id)
    .bind(&product.name)
    .bind(product.price)
    .bind(product.cost)
    .bind(product.stock)
    .bind(product.min_stock)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(conn)
    .await?;

    Ok(product)
}

pub(crate) async fn apply_update(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    merchant_id: &str,
    update: &ProductUpdate,
) -> DbResult<()> {
    debug!(id = %update.id, "Updating product");

    let result = sqlx::query(
        r#"
        UPDATE products SET
            name = COALESCE(?2, name),
            price = COALESCE(?3, price),
            cost = COALESCE(?4, cost),
            min_stock = COALESCE(?5, min_stock),
            updated_at = ?6
        WHERE id = ?1 AND merchant_id = ?7
        "#,
    )
    .bind(&update.id)
    .bind(update.name.as_deref().map(str::trim))
    .bind(update.price)
    .bind(update.cost)
    .bind(update.min_stock)
    .bind(Utc::now())
    .bind(merchant_id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", &update.id));
    }

    Ok(())
}

pub(crate) async fn delete_product(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    merchant_id: &str,
    id: &str,
) -> DbResult<()> {
    debug!(id = %id, "Deleting product");

    let result = sqlx::query("DELETE FROM products WHERE id = ?1 AND merchant_id = ?2")
        .bind(id)
        .bind(merchant_id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

pub(crate) async fn increment_stock(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    merchant_id: &str,
    id: &str,
    quantity: i64,
) -> DbResult<()> {
    debug!(id = %id, quantity, "Incrementing stock");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock + ?2, updated_at = ?3
        WHERE id = ?1 AND merchant_id = ?4
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(Utc::now())
    .bind(merchant_id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

pub(crate) async fn decrement_stock_if_available(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    merchant_id: &str,
    id: &str,
    quantity: i64,
) -> DbResult<bool> {
    debug!(id = %id, quantity, "Decrementing stock");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock - ?2, updated_at = ?3
        WHERE id = ?1 AND merchant_id = ?4 AND stock >= ?2
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(Utc::now())
    .bind(merchant_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Escapes LIKE wildcards so a spoken "50%" matches literally.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    const MERCHANT: &str = "m-1";

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("pan"), "pan");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }

    #[tokio::test]
    async fn test_insert_applies_defaults() {
        let db = db().await;
        let product = db
            .products()
            .insert(MERCHANT, &NewProduct::new("  Pulsera  ", 1500, 0))
            .await
            .unwrap();

        assert_eq!(product.name, "Pulsera");
        assert_eq!(product.cost, 0);
        assert_eq!(product.min_stock, 5);

        let stored = db.products().get_by_id(MERCHANT, &product.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Pulsera");
        assert_eq!(stored.price, 1500);
    }

    #[tokio::test]
    async fn test_list_is_scoped_and_ordered() {
        let db = db().await;
        let repo = db.products();
        repo.insert(MERCHANT, &NewProduct::new("Pan amasado", 200, 10))
            .await
            .unwrap();
        repo.insert("other", &NewProduct::new("Queso", 3000, 1))
            .await
            .unwrap();
        repo.insert(MERCHANT, &NewProduct::new("Pan integral", 250, 10))
            .await
            .unwrap();

        let names: Vec<String> = repo
            .list_for_merchant(MERCHANT)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Pan amasado", "Pan integral"]);
        assert_eq!(repo.count(MERCHANT).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_first_containing() {
        let db = db().await;
        let repo = db.products();
        repo.insert(MERCHANT, &NewProduct::new("Latas de bebida", 900, 0))
            .await
            .unwrap();

        let found = repo.find_first_containing(MERCHANT, "LATAS").await.unwrap();
        assert_eq!(found.unwrap().name, "Latas de bebida");

        let missing = repo.find_first_containing(MERCHANT, "%").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_conditional_decrement() {
        let db = db().await;
        let repo = db.products();
        let product = repo
            .insert(MERCHANT, &NewProduct::new("Dubai", 1500, 3))
            .await
            .unwrap();

        assert!(repo.decrement_stock_if_available(MERCHANT, &product.id, 2).await.unwrap());
        assert!(!repo.decrement_stock_if_available(MERCHANT, &product.id, 2).await.unwrap());

        let stored = repo.get_by_id(MERCHANT, &product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 1);

        repo.increment_stock(MERCHANT, &product.id, 10).await.unwrap();
        let stored = repo.get_by_id(MERCHANT, &product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 11);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = db().await;
        let repo = db.products();
        let product = repo
            .insert(MERCHANT, &NewProduct::new("Anillo", 5000, 2))
            .await
            .unwrap();

        repo.update(MERCHANT, &ProductUpdate {
            id: product.id.clone(),
            price: Some(5500),
            ..Default::default()
        })
        .await
        .unwrap();
        let stored = repo.get_by_id(MERCHANT, &product.id).await.unwrap().unwrap();
        assert_eq!(stored.price, 5500);
        assert_eq!(stored.name, "Anillo");

        assert!(matches!(
            repo.delete("other", &product.id).await,
            Err(DbError::NotFound { .. })
        ));
        repo.delete(MERCHANT, &product.id).await.unwrap();
        assert!(repo.get_by_id(MERCHANT, &product.id).await.unwrap().is_none());

        assert!(matches!(
            repo.increment_stock(MERCHANT, &product.id, 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_other_merchant_cannot_touch_product() {
        let db = db().await;
        let repo = db.products();
        let product = repo
            .insert(MERCHANT, &NewProduct::new("Dubai", 1500, 3))
            .await
            .unwrap();

        assert!(repo.get_by_id("other", &product.id).await.unwrap().is_none());
        assert!(!repo
            .decrement_stock_if_available("other", &product.id, 1)
            .await
            .unwrap());
        assert!(matches!(
            repo.increment_stock("other", &product.id, 100).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            repo.update(
                "other",
                &ProductUpdate {
                    id: product.id.clone(),
                    price: Some(1),
                    ..Default::default()
                }
            )
            .await,
            Err(DbError::NotFound { .. })
        ));

        let stored = repo.get_by_id(MERCHANT, &product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 3);
        assert_eq!(stored.price, 1500);
    }
}
