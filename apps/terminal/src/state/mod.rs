//! # State Module
//!
//! Application state for the console and its commands.
//!
//! Each command takes only the state it needs instead of one `AppState`:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      Console loop (lib.rs)                      │   │
//! │  │  let db = DbState::new(database);                               │   │
//! │  │  let cart = CartState::new();                                   │   │
//! │  │  let config = ConfigState::from_env()?;                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                              │                                          │
//! │          ┌──────────────────┼──────────────────┐                       │
//! │          ▼                  ▼                  ▼                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │   DbState    │  │  CartState   │  │   ConfigState    │              │
//! │  │              │  │              │  │                  │              │
//! │  │  Database    │  │  Arc<Mutex<  │  │  merchant_id     │              │
//! │  │  (SQLite     │  │    Cart      │  │  utc offset      │              │
//! │  │   pool)      │  │  >>          │  │  threshold       │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • CartState: Protected by Arc<Mutex<T>> for exclusive access          │
//! │  • ConfigState: Read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod config;
mod db;

pub use cart::{Cart, CartItem, CartState, CartTotals};
pub use config::{ConfigError, ConfigState};
pub use db::DbState;
