//! # API Error Type
//!
//! Unified error type for the executor and console commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Emprende                               │
//! │                                                                         │
//! │  Console                     Rust Backend                               │
//! │  ───────                     ────────────                               │
//! │                                                                         │
//! │  "vendí 3 pulseras"                                                     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Storage Error? ─── DbError::QueryFailed("...") ──┐ (logged)    │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Business Error? ─── CoreError::OutOfStock ────── ApiError ────►│  │
//! │  │         │               (Spanish text kept)                      │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ◄──── "No puedes vender Pulsera (Stock: 0). Repone stock u ..."       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Core messages are already the final user-facing text, so they pass
//! through unchanged. Storage failures are logged with their detail and
//! replaced by a generic Spanish message.

use serde::Serialize;

use emprende_core::{CoreError, ValidationError};
use emprende_db::DbError;

/// Error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Solo tienes 2 unidades de Dubai. Repone stock si quieres completar el pedido."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Spanish message for display
    pub message: String,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Database operation failed
    DatabaseError,

    /// Internal error
    Internal,

    /// Cart operation failed
    CartError,

    /// Insufficient stock
    InsufficientStock,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn cart(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CartError, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => {
                ApiError::not_found(format!("No se encontró {}: {}", entity_label(&entity), id))
            }
            DbError::UniqueViolation { field, value } => {
                ApiError::validation(format!("Ya existe un registro con {} '{}'", field, value))
            }
            DbError::StockConflict {
                product_id,
                quantity,
            } => {
                // Only reachable when another sale won the race after validation
                tracing::warn!(product_id = %product_id, quantity, "Stock conflict at commit");
                ApiError::new(
                    ErrorCode::InsufficientStock,
                    "El stock cambió mientras se registraba la venta. Intenta de nuevo.",
                )
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "No se pudo conectar a la base de datos")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "No se pudo preparar la base de datos")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Error al guardar los datos")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Error al guardar los datos")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Referencia inválida")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "La base de datos está ocupada")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::internal("Error inesperado al guardar los datos")
            }
        }
    }
}

/// Converts core errors to API errors. The message is the core `Display`.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::RestockProductNotFound { .. }
            | CoreError::SaleProductNotFound { .. }
            | CoreError::CartProductMissing { .. } => ErrorCode::NotFound,
            CoreError::OutOfStock { .. }
            | CoreError::StockShortage { .. }
            | CoreError::CartStockShortage { .. } => ErrorCode::InsufficientStock,
            CoreError::EmptyCart
            | CoreError::NotInCart { .. }
            | CoreError::CartTooLarge { .. } => ErrorCode::CartError,
            CoreError::QuantityTooLarge { .. } | CoreError::Validation(_) => {
                ErrorCode::ValidationError
            }
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

fn entity_label(entity: &str) -> &str {
    match entity {
        "Product" => "el producto",
        "Transaction" => "el movimiento",
        other => other,
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
