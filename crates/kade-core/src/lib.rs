//! # kade-core: Pure Business Logic for Kade POS
//!
//! Everything the backend needs to reason about a sale without touching the
//! database: money, entity types, sale arithmetic, validation and the
//! negative-balance policy.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kade POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              React front end (cashier / inventory)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP/JSON (/api)                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 kade-server (axum routes)                       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kade-core (THIS CRATE) ★                        │   │
//! │  │   types • money • sale • validation • policy                    │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kade-db (SQLite layer)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Product, Customer, Sale, SaleItem, User, ...)
//! - [`money`] - Integer money in minor currency units
//! - [`sale`] - Sale requests, totals and sale numbers
//! - [`policy`] - What happens when stock or points would go negative
//! - [`validation`] - Input rules
//! - [`error`] - Domain error types
//!
//! ## Example
//!
//! ```rust
//! use kade_core::money::Money;
//! use kade_core::sale::{NewSale, SaleLine};
//! use kade_core::PaymentMethod;
//!
//! let sale = NewSale {
//!     customer_id: None,
//!     items: vec![SaleLine { product_id: 1, quantity: 3, unit_price: Money::from_cents(500) }],
//!     payment_method: PaymentMethod::Cash,
//!     discount: Money::from_cents(50),
//! };
//! assert_eq!(sale.total().cents(), 1450);
//! ```

pub mod error;
pub mod money;
pub mod policy;
pub mod sale;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use policy::BalancePolicy;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of line items in a single sale.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// Catches keying mistakes (1000 typed instead of 10) at the register.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Largest stock or loyalty-point change accepted in one adjustment,
/// in either direction. Keeps `balance + delta` far from i64 overflow.
pub const MAX_BALANCE_DELTA: i64 = 1_000_000_000;

/// Prefix of every human-readable sale number.
pub const SALE_NUMBER_PREFIX: &str = "SALE";
