//! # Repository Module
//!
//! Database repository implementations for Emprende.
//!
//! ## Shared Statements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Each statement is written once, as a free function generic over the   │
//! │  sqlx executor, and reached two ways:                                   │
//! │                                                                         │
//! │  ProductRepository { pool }                                            │
//! │  ├── get_by_id(m, id) ───────►  product::fetch_by_id(&pool, m, id)     │
//! │                                                                         │
//! │  UnitOfWork { tx }                                                     │
//! │  └── product_by_id(m, id) ───►  product::fetch_by_id(&mut *tx, m, id)  │
//! │                                                                         │
//! │  Same SQL, whether it runs alone or inside a sale's transaction.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Catalog CRUD and stock movements
//! - [`TransactionRepository`] - Ledger rows and aggregates
//!
//! [`ProductRepository`]: product::ProductRepository
//! [`TransactionRepository`]: transaction::TransactionRepository

pub mod product;
pub mod transaction;
