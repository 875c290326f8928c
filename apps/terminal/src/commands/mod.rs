//! # Commands Module
//!
//! Everything the console (or any other front end) can ask the backend to do.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs          ◄─── You are here (exports)
//! ├── voice.rs        ◄─── Utterance → intent → executor dispatch
//! ├── transaction.rs  ◄─── Stock-aware executor, ledger listing/deletion
//! ├── pos.rs          ◄─── Cart manipulation and checkout
//! ├── product.rs      ◄─── Product creation, deletion, bulk stock editor
//! └── report.rs       ◄─── Dashboard metrics and insights
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  Console line                                                           │
//! │  ────────────                                                           │
//! │  "vendí 1 dubai y 3 macizos"                                            │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  voice::run_utterance(&db, &config, line)                               │
//! │         │                                                               │
//! │         ├── parse ──► ParsedIntent::MultiSale { items }                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  transaction::commit_multi_item(&db, &config, &items)                   │
//! │         │                                                               │
//! │         │  BEGIN → validate all → decrement + insert → COMMIT           │
//! │         ▼                                                               │
//! │  VoiceReply { success: true, message: "Venta de 2 productos ..." }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Injection
//! Each command declares only the state it needs:
//! ```rust,ignore
//! // Only needs database + merchant scope
//! async fn delete_product(db: &DbState, config: &ConfigState, id: &str)
//!
//! // Only needs cart
//! fn clear_cart(cart: &CartState)
//!
//! // Needs all three
//! async fn checkout_cart(db: &DbState, cart: &CartState, config: &ConfigState, ..)
//! ```

pub mod pos;
pub mod product;
pub mod report;
pub mod transaction;
pub mod voice;
