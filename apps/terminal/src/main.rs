//! # Emprende Console Entry Point
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Emprende Console                                 │
//! │                                                                         │
//! │  stdin ──► lib.rs (Console::handle_line)                                │
//! │               │                                                         │
//! │               ├── commands/voice ──► commands/transaction (executor)    │
//! │               ├── commands/pos                                          │
//! │               └── commands/report                                       │
//! │                            │                                            │
//! │                            ▼                                            │
//! │               SQLite: emprende.db (WAL mode)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The actual setup is in lib.rs so the console can be driven from tests.

#[tokio::main]
async fn main() {
    if let Err(err) = emprende_terminal_lib::run().await {
        eprintln!("emprende: {}", err);
        std::process::exit(1);
    }
}
