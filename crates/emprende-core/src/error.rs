//! # Error Types
//!
//! Domain-specific error types for emprende-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  emprende-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule failures (not found, stock)      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  emprende-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  terminal errors (in app)                                              │
//! │  └── ApiError         - What the merchant sees                         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Merchant               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Messages Are Final Text
//! Every `Display` string below is shown to the merchant verbatim, in
//! Spanish. Callers must not wrap or translate them.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A restock named a product that no stored name contains.
    #[error("No encontré el producto \"{query}\".")]
    RestockProductNotFound { query: String },

    /// A quantity sale named a product the resolver could not match.
    ///
    /// ## User Workflow
    /// ```text
    /// "vendí 3 alfajores"
    ///      │
    ///      ▼
    /// resolve("alfajores") → None
    ///      │
    ///      ▼
    /// Merchant is told to create the product or say a cash amount
    /// ```
    #[error("No encontré el producto \"{query}\" en tu inventario. Crea el producto primero o di el monto en dinero.")]
    SaleProductNotFound { query: String },

    /// The matched product has no stock at all.
    #[error("No puedes vender {product} (Stock: 0). Repone stock u ofrece otra opción al cliente.")]
    OutOfStock { product: String },

    /// The matched product has some stock, but less than requested.
    #[error("Solo tienes {available} unidades de {product}. Repone stock si quieres completar el pedido.")]
    StockShortage {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Checkout was attempted with nothing in the cart.
    #[error("El carrito está vacío")]
    EmptyCart,

    /// A cart line references a product that no longer exists.
    #[error("Producto no encontrado: {name}")]
    CartProductMissing { name: String },

    /// A cart line asks for more units than are in stock.
    #[error("Stock insuficiente para {name}. Disponibles: {available}")]
    CartStockShortage { name: String, available: i64 },

    /// A product id is not present in the cart.
    #[error("El producto {product_id} no está en el carrito")]
    NotInCart { product_id: String },

    /// Cart has exceeded maximum allowed lines.
    #[error("El carrito no puede tener más de {max} productos")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("La cantidad {requested} supera el máximo permitido ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Whether this error means "the shelf can't cover the request".
    pub fn is_stock_error(&self) -> bool {
        matches!(
            self,
            CoreError::OutOfStock { .. }
                | CoreError::StockShortage { .. }
                | CoreError::CartStockShortage { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("El campo {field} es obligatorio")]
    Required { field: String },

    /// Field value is too long.
    #[error("El campo {field} admite como máximo {max} caracteres")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("El campo {field} debe ser mayor que cero")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("El campo {field} no puede ser negativo")]
    Negative { field: String },

    /// Value is above the accepted ceiling.
    #[error("El campo {field} no puede superar {}", grouped(.max))]
    TooLarge { field: String, max: i64 },

    /// A computed line or total does not fit in the ledger.
    #[error("El total de {field} es demasiado grande")]
    Overflow { field: String },

    /// Invalid format (e.g., malformed date).
    #[error("El campo {field} tiene un formato inválido: {reason}")]
    InvalidFormat { field: String, reason: String },
}

fn grouped(max: &i64) -> String {
    crate::money::format_thousands(*max)
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
