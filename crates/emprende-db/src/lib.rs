//! # emprende-db: Database Layer for Emprende
//!
//! SQLite storage for the product catalog and the transaction ledger.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Emprende Data Flow                               │
//! │                                                                         │
//! │  Terminal command (run_utterance, checkout_cart, ...)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   emprende-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo    │    │ 001_init.sql │  │   │
//! │  │   │ SqlitePool    │◄───│ TransactionRepo│    │              │  │   │
//! │  │   │ begin() ──────┼──► │ UnitOfWork     │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <data dir>/emprende/emprende.db                              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Product and transaction repositories
//! - [`unit_of_work`] - Several writes committed as one SQLite transaction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use emprende_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("emprende.db")).await?;
//!
//! let catalog = db.products().list_for_merchant(merchant_id).await?;
//!
//! let mut uow = db.begin().await?;
//! uow.decrement_stock(merchant_id, &product.id, 3).await?;
//! uow.record(merchant_id, &new_tx).await?;
//! uow.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use unit_of_work::UnitOfWork;

// Repository re-exports for convenience
pub use repository::product::ProductRepository;
pub use repository::transaction::TransactionRepository;
