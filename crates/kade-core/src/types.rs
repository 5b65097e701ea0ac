//! # Domain Types
//!
//! Entities and request bodies used throughout Kade POS.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (i64)       │   │  id (i64)       │       │
//! │  │  barcode        │◄──│  sale_number    │──►│  loyalty_points │       │
//! │  │  price (Money)  │   │  total_amount   │   └─────────────────┘       │
//! │  │  stock_quantity │   │  status         │                             │
//! │  └─────────────────┘   └────────┬────────┘                             │
//! │           ▲                     │ 1..n                                  │
//! │           │            ┌────────▼────────┐   ┌─────────────────┐       │
//! │           └────────────│    SaleItem     │   │      User       │       │
//! │                        │  unit_price     │   │  password_hash  │       │
//! │                        │  total_price    │   │  role           │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ids are SQLite rowids. Money fields are [`Money`] in minor units.
//! JSON field names follow the REST surface the front end already speaks
//! (`price`, `stock_quantity`, `total_amount`, ...).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{
    normalize_optional, validate_barcode, validate_email, validate_name, validate_non_negative,
    ValidationResult,
};

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Scanner code. Unique among active products.
    pub barcode: Option<String>,

    pub description: Option<String>,

    pub category: Option<String>,

    /// Shelf price.
    pub price: Money,

    /// Purchase cost, for margin reporting.
    pub cost: Option<Money>,

    /// Units on hand. Can be negative when the stock policy is `allow`.
    pub stock_quantity: i64,

    /// Reorder threshold: the product counts as low stock at or below it.
    pub min_stock_level: i64,

    pub supplier: Option<String>,

    pub image_url: Option<String>,

    /// False once the product is deleted (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether the product is at or below its reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock_level
    }
}

/// Body of `POST /products` and `PUT /products/{id}`.
///
/// `PUT` is a full replace of the mutable fields, so both use one type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub cost: Option<Money>,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub min_stock_level: i64,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ProductInput {
    /// Trims text fields, turns blank optional strings into `None` and
    /// validates the result.
    ///
    /// ```rust
    /// use kade_core::{Money, ProductInput};
    ///
    /// let input = ProductInput {
    ///     name: "  Basmati Rice ".into(),
    ///     barcode: Some("".into()),
    ///     price: Money::from_cents(85000),
    ///     ..Default::default()
    /// }
    /// .normalized()
    /// .unwrap();
    ///
    /// assert_eq!(input.name, "Basmati Rice");
    /// assert_eq!(input.barcode, None);
    /// ```
    pub fn normalized(self) -> ValidationResult<Self> {
        let input = ProductInput {
            name: self.name.trim().to_string(),
            barcode: normalize_optional(self.barcode),
            description: normalize_optional(self.description),
            category: normalize_optional(self.category),
            supplier: normalize_optional(self.supplier),
            image_url: normalize_optional(self.image_url),
            ..self
        };

        validate_name("name", &input.name)?;
        if let Some(barcode) = &input.barcode {
            validate_barcode(barcode)?;
        }
        validate_non_negative("price", input.price.cents())?;
        if let Some(cost) = input.cost {
            validate_non_negative("cost", cost.cents())?;
        }
        validate_non_negative("min_stock_level", input.min_stock_level)?;

        Ok(input)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer with a loyalty balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Loyalty balance. Can be negative when the loyalty policy is `allow`.
    pub loyalty_points: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /customers` and `PUT /customers/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInput {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl CustomerInput {
    pub fn normalized(self) -> ValidationResult<Self> {
        let input = CustomerInput {
            name: self.name.trim().to_string(),
            email: normalize_optional(self.email),
            phone: normalize_optional(self.phone),
            address: normalize_optional(self.address),
        };

        validate_name("name", &input.name)?;
        if let Some(email) = &input.email {
            validate_email(email)?;
        }

        Ok(input)
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a recorded sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale has been paid and stock taken out.
    #[default]
    Completed,
    /// Sale was cancelled and its stock put back.
    Voided,
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    #[default]
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Mobile wallet / QR payment.
    Mobile,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Mobile];

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Mobile => "mobile",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL.iter().map(|m| m.to_string()).collect(),
            })
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    /// `SALE-YYYY-MM-DD-NNN`, unique.
    pub sale_number: String,
    /// Business day the sale number was drawn from.
    #[ts(as = "String")]
    pub sale_day: NaiveDate,
    pub customer_id: Option<i64>,
    /// Σ line totals − discount, computed by the server.
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub discount_amount: Money,
    pub status: SaleStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub voided_at: Option<DateTime<Utc>>,
}

/// A sale row joined with its customer's name, as listed by `GET /sales`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleSummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub sale: Sale,
    pub customer_name: Option<String>,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
///
/// The unit price is frozen at the time of sale; later price changes on the
/// product do not touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    /// unit_price × quantity.
    pub total_price: Money,
}

/// A line item joined with its product name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItemDetail {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub item: SaleItem,
    pub product_name: Option<String>,
}

/// Response of `GET /sales/{id}`: the sale, its customer and its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub summary: SaleSummary,
    pub items: Vec<SaleItemDetail>,
}

/// What a completed sale transaction hands back to the register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleReceipt {
    pub id: i64,
    pub sale_number: String,
    pub total_amount: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// User
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    Cashier,
    #[default]
    User,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Cashier => "cashier",
            UserRole::User => "user",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A staff account.
///
/// The password hash never leaves the server: it is skipped on
/// serialization and has no TypeScript counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: UserRole,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// The user fields returned next to a login token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Counts and sums shown on the dashboard.
///
/// All zero on an empty database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DashboardStats {
    /// Active products.
    pub total_products: i64,
    /// Active products at or below their reorder threshold.
    pub low_stock_items: i64,
    pub total_customers: i64,
    /// Σ totals of completed sales on the requested day.
    pub today_sales: Money,
    /// Σ totals of all completed sales.
    pub total_sales: Money,
    pub today_sales_count: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
