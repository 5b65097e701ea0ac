//! # Error Types
//!
//! Domain-specific error types for kade-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kade-core errors (this file)                                           │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  kade-db errors (separate crate)                                        │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  kade-server errors                                                     │
//! │  └── ApiError         - What the client sees: {"error": "..."}          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → HTTP          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A sale request with no lines.
    #[error("Sale must contain at least one item")]
    EmptySale,

    /// Sale has more lines than the register accepts.
    #[error("Sale cannot have more than {max} items")]
    TooManyLines { max: usize },

    /// Discount larger than the sum of the lines.
    #[error("Discount {discount} exceeds subtotal {subtotal}")]
    DiscountExceedsSubtotal { discount: Money, subtotal: Money },

    /// A line or sale total that does not fit in an i64.
    #[error("Sale amount is too large")]
    AmountOverflow,

    /// Stock would go below zero under the `reject` policy.
    ///
    /// ## When This Occurs
    /// ```text
    /// POST /api/sales  { product 7, qty 5 }
    ///      │
    ///      ▼
    /// stock_quantity = 3, policy.stock = reject
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: 7, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// 409, transaction rolled back
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Loyalty points would go below zero under the `reject` policy.
    #[error("Insufficient loyalty points for customer {customer_id}: balance {balance}, change {delta}")]
    InsufficientPoints {
        customer_id: i64,
        balance: i64,
        delta: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for failures caused by a balance policy refusing a change.
    pub fn is_balance_conflict(&self) -> bool {
        matches!(
            self,
            CoreError::InsufficientStock { .. } | CoreError::InsufficientPoints { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any SQL runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g. a barcode with spaces, a bad date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {}", .allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
