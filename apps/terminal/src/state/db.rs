//! # Database State
//!
//! Wraps the `Database` connection for use in commands.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! pub async fn create_product(
//!     db: &DbState,
//!     config: &ConfigState,
//!     new: NewProduct,
//! ) -> ApiResult<ProductCreated> {
//!     let product = db.inner().products().insert(&config.merchant_id, &new).await?;
//!     ...
//! }
//! ```

use emprende_db::Database;

/// Owns the database handle shared by every command.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
