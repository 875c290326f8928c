//! # Emprende Terminal Library
//!
//! Core library for the Emprende point-of-sale console.
//! This is the main entry point that wires state together and runs the
//! read-eval-print loop.
//!
//! ## Module Organization
//! ```text
//! emprende_terminal_lib/
//! ├── lib.rs              ◄─── You are here (startup & console loop)
//! ├── state/
//! │   ├── mod.rs          ◄─── State type exports
//! │   ├── db.rs           ◄─── Database state wrapper
//! │   ├── cart.rs         ◄─── Cart state management
//! │   └── config.rs       ◄─── Configuration state
//! ├── commands/
//! │   ├── mod.rs          ◄─── Command exports
//! │   ├── voice.rs        ◄─── Utterance → executor dispatch
//! │   ├── transaction.rs  ◄─── Stock-aware executor, ledger queries
//! │   ├── pos.rs          ◄─── Cart manipulation and checkout
//! │   ├── product.rs      ◄─── Catalog maintenance
//! │   └── report.rs       ◄─── Dashboard and insight panels
//! └── error.rs            ◄─── API error type for commands
//! ```
//!
//! ## Console Input
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stdin line                                                             │
//! │     │                                                                   │
//! │     ├── starts with "/" ──► console command (/productos, /cobrar, ...)  │
//! │     │                                                                   │
//! │     └── anything else ────► run_utterance ("vendí 3 pulseras")          │
//! │                                                                         │
//! │  Replies go to stdout. Logs go to stderr.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod state;

use std::path::PathBuf;

use chrono::Utc;
use directories::ProjectDirs;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use commands::{pos, product, report, transaction, voice};
use emprende_core::Money;
use emprende_db::{Database, DbConfig};
use error::ApiResult;
use state::{CartState, ConfigState, DbState};

const HELP: &str = "\
Escribe lo que vendiste, gastaste o repusiste:
  vendí 3 pulseras y 1 dubai
  venta de 5000
  gasté 2000 en taxi
  llegaron 50 latas
  nuevo producto pan a 1000 con 20 unidades

Comandos:
  /productos                   lista el catálogo
  /carrito [id] [cantidad]     muestra el carrito o agrega un producto
  /quitar <id>                 saca un producto del carrito
  /vaciar                      vacía el carrito
  /cobrar [método]             cobra el carrito (CASH, DEBIT, CREDIT, TRANSFER)
  /resumen                     ventas y gastos de hoy
  /historial <desde> <hasta>   movimientos entre dos fechas (AAAA-MM-DD)
  /borrar <id>                 elimina un movimiento
  /ventas /gastos /inventario  paneles de análisis
  /riesgo                      alerta más urgente
  /descartar <id>              oculta una alerta
  /ayuda                       esta ayuda
  /salir                       termina";

/// Runs the console.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Console Startup                                   │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter, written to stderr             │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • EMPRENDE_* environment variables over defaults                    │
/// │                                                                         │
/// │  3. Connect to Database ──────────────────────────────────────────────► │
/// │     • Linux: ~/.local/share/emprende-pos/emprende.db                    │
/// │     • SQLite with WAL mode, pending migrations applied                  │
/// │                                                                         │
/// │  4. Read stdin line by line until EOF or /salir                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = ConfigState::from_env()?;
    info!(merchant_id = %config.merchant_id, "Starting Emprende console");

    let db_path = get_database_path(&config)?;
    info!(?db_path, "Database path determined");

    let db = Database::new(DbConfig::new(db_path)).await?;
    info!("Database connected and migrations applied");

    let mut console = Console::new(DbState::new(db), CartState::new(), config);

    let mut stdout = tokio::io::stdout();
    let banner = format!(
        "{}: escribe /ayuda para ver los comandos.\n",
        console.config.store_name
    );
    stdout.write_all(banner.as_bytes()).await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match console.handle_line(&line).await {
            Reply::Text(text) => {
                stdout.write_all(text.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
            Reply::Silent => {}
            Reply::Exit => break,
        }
    }

    console.db.inner().close().await;
    info!("Console closed");
    Ok(())
}

// =============================================================================
// Console
// =============================================================================

/// What the loop does after one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Silent,
    Exit,
}

/// Console session: the three state objects plus the alerts dismissed
/// during this session.
pub struct Console {
    pub db: DbState,
    pub cart: CartState,
    pub config: ConfigState,
    dismissed_alerts: Vec<String>,
}

impl Console {
    pub fn new(db: DbState, cart: CartState, config: ConfigState) -> Self {
        Console {
            db,
            cart,
            config,
            dismissed_alerts: Vec::new(),
        }
    }

    /// Handles one input line. Command errors become reply text.
    pub async fn handle_line(&mut self, line: &str) -> Reply {
        let line = line.trim();
        if line.is_empty() {
            return Reply::Silent;
        }

        if !line.starts_with('/') {
            let reply = voice::run_utterance(&self.db, &self.config, line).await;
            return Reply::Text(reply.message);
        }

        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();
        debug!(command, ?args, "Console command");

        match command {
            "/salir" => Reply::Exit,
            "/ayuda" => Reply::Text(HELP.to_string()),
            _ => match self.run_command(command, &args).await {
                Ok(text) => Reply::Text(text),
                Err(err) => Reply::Text(err.message),
            },
        }
    }

    async fn run_command(&mut self, command: &str, args: &[&str]) -> ApiResult<String> {
        let (db, cart, config) = (&self.db, &self.cart, &self.config);

        match (command, args) {
            ("/productos", _) => {
                let products = product::list_products(db, config).await?;
                Ok(format_products(&products))
            }

            ("/carrito", []) => Ok(to_json(&pos::get_cart(cart))),
            ("/carrito", [id]) => Ok(to_json(&pos::add_to_cart(db, cart, config, id, None).await?)),
            ("/carrito", [id, quantity, ..]) => {
                let quantity = parse_number("cantidad", quantity)?;
                Ok(to_json(
                    &pos::add_to_cart(db, cart, config, id, Some(quantity)).await?,
                ))
            }
            ("/quitar", [id, ..]) => Ok(to_json(&pos::remove_from_cart(cart, id)?)),
            ("/vaciar", _) => Ok(to_json(&pos::clear_cart(cart))),
            ("/cobrar", method) => {
                let outcome = pos::checkout_cart(db, cart, config, method.first().copied()).await?;
                Ok(format!(
                    "Venta de {} cobrada. Comprobante {}.",
                    Money::from_pesos(outcome.total),
                    outcome.group_id
                ))
            }

            ("/resumen", _) => Ok(to_json(&report::dashboard_metrics(db, config, Utc::now()).await?)),
            ("/historial", [from, to, ..]) => Ok(to_json(
                &transaction::list_transactions_by_range(db, config, from, to).await?,
            )),
            ("/borrar", [id, ..]) => {
                transaction::delete_transaction(db, config, id).await?;
                Ok("Movimiento eliminado.".to_string())
            }

            ("/ventas", _) => Ok(to_json(&report::sales_insights(db, config).await?)),
            ("/gastos", _) => Ok(to_json(&report::expense_insights(db, config).await?)),
            ("/inventario", _) => Ok(to_json(&report::inventory_insights(db, config).await?)),
            ("/riesgo", _) => {
                match report::risk_alert(db, config, Utc::now(), &self.dismissed_alerts).await? {
                    Some(alert) => Ok(to_json(&alert)),
                    None => Ok("Sin alertas por ahora.".to_string()),
                }
            }
            ("/descartar", [id, ..]) => {
                self.dismissed_alerts.push(id.to_string());
                Ok("Alerta descartada.".to_string())
            }

            _ => Ok(format!("Comando desconocido: {}. Escribe /ayuda.", command)),
        }
    }
}

fn parse_number(field: &str, raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>().map_err(|_| {
        error::ApiError::validation(format!("{} debe ser un número entero: '{}'", field, raw))
    })
}

fn format_products(products: &[emprende_core::Product]) -> String {
    if products.is_empty() {
        return "No hay productos. Prueba: nuevo producto pan a 1000".to_string();
    }

    products
        .iter()
        .map(|p| {
            format!(
                "{}  {}  {}  stock {}",
                p.id,
                p.name,
                Money::from_pesos(p.price),
                p.stock
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|err| format!("No se pudo mostrar la respuesta: {}", err))
}

// =============================================================================
// Startup Helpers
// =============================================================================

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=emprende=trace` - Show trace for emprende crates only
/// - Default: INFO, debug for emprende crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,emprende=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines the database file path.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.emprende.pos/emprende.db`
/// - **Windows**: `%APPDATA%\emprende\pos\emprende.db`
/// - **Linux**: `~/.local/share/emprende-pos/emprende.db`
///
/// ## Override
/// `EMPRENDE_DB_PATH` (through [`ConfigState::database_path`]).
fn get_database_path(config: &ConfigState) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(path) = &config.database_path {
        return Ok(path.clone());
    }

    let proj_dirs = ProjectDirs::from("com", "emprende", "pos")
        .ok_or("Could not determine app data directory")?;

    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.join("emprende.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use emprende_core::NewProduct;

    async fn console() -> Console {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Console::new(DbState::new(db), CartState::new(), ConfigState::default())
    }

    fn text(reply: Reply) -> String {
        match reply {
            Reply::Text(text) => text,
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_and_exit_lines() {
        let mut console = console().await;
        assert_eq!(console.handle_line("   ").await, Reply::Silent);
        assert_eq!(console.handle_line("/salir").await, Reply::Exit);
    }

    #[tokio::test]
    async fn test_utterance_goes_to_voice() {
        let mut console = console().await;
        let reply = text(console.handle_line("venta de 5000").await);
        assert_eq!(reply, "¡Venta de $5.000 registrada!");
    }

    #[tokio::test]
    async fn test_cart_commands() {
        let mut console = console().await;
        let pan = console
            .db
            .inner()
            .products()
            .insert(&console.config.merchant_id, &NewProduct::new("Pan", 200, 30))
            .await
            .unwrap();

        console.handle_line(&format!("/carrito {} 3", pan.id)).await;
        let reply = text(console.handle_line("/cobrar").await);
        assert!(reply.starts_with("Venta de $600 cobrada."));

        let reply = text(console.handle_line(&format!("/carrito {} tres", pan.id)).await);
        assert!(reply.contains("cantidad"));
    }

    #[tokio::test]
    async fn test_help_lists_payment_methods() {
        use emprende_core::payment_method::{CASH, CREDIT, DEBIT, TRANSFER};

        let mut console = console().await;
        let help = text(console.handle_line("/ayuda").await);
        for method in [CASH, DEBIT, CREDIT, TRANSFER] {
            assert!(help.contains(method), "{} missing from help", method);
        }
        assert!(!help.contains("CARD,"));
    }

    #[tokio::test]
    async fn test_errors_become_text() {
        let mut console = console().await;
        let reply = text(console.handle_line("/cobrar").await);
        assert!(!reply.is_empty());

        let reply = text(console.handle_line("/nada").await);
        assert_eq!(reply, "Comando desconocido: /nada. Escribe /ayuda.");
    }

    #[tokio::test]
    async fn test_dismissed_alert_is_hidden() {
        let mut console = console().await;
        console
            .db
            .inner()
            .products()
            .insert(&console.config.merchant_id, &NewProduct::new("Dubai", 1500, 1))
            .await
            .unwrap();

        let alert = report::risk_alert(&console.db, &console.config, Utc::now(), &[])
            .await
            .unwrap()
            .unwrap();
        console.handle_line(&format!("/descartar {}", alert.id)).await;

        let reply = text(console.handle_line("/riesgo").await);
        assert_eq!(reply, "Sin alertas por ahora.");
    }
}
