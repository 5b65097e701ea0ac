//! # Sale Module
//!
//! The pure half of the sale transaction: the request, its arithmetic and
//! the sale number format. The database half lives in
//! `kade_db::repository::SaleRepository::create_sale`.
//!
//! ## Total Calculation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Line   unit_price × quantity = line total                              │
//! │  ─────────────────────────────────────────────                          │
//! │  Rice         500 ×  3        =  1500                                   │
//! │                                 ─────                                   │
//! │  Subtotal (S)                    1500                                   │
//! │  Discount (D)                   −  50                                   │
//! │                                 ─────                                   │
//! │  total_amount = S − D            1450                                   │
//! │                                                                         │
//! │  Tax is a display value on the register and is never stored.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::PaymentMethod;
use crate::validation::{validate_non_negative, validate_quantity};
use crate::{MAX_SALE_LINES, SALE_NUMBER_PREFIX};

// =============================================================================
// Sale Request
// =============================================================================

/// One requested line: which product, how many, at what price.
///
/// The unit price comes from the register, not from the catalog, so a
/// cashier-applied price override is recorded as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
}

impl SaleLine {
    /// unit_price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    fn checked_line_total(&self) -> CoreResult<Money> {
        self.unit_price
            .checked_multiply_quantity(self.quantity)
            .ok_or(CoreError::AmountOverflow)
    }
}

/// Body of `POST /sales`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    #[serde(default)]
    pub customer_id: Option<i64>,
    pub items: Vec<SaleLine>,
    pub payment_method: PaymentMethod,
    #[serde(default, rename = "discount_amount")]
    pub discount: Money,
}

impl NewSale {
    /// Checks everything that can be checked without the database.
    ///
    /// ## Rules
    /// - At least one line, at most MAX_SALE_LINES (100)
    /// - Every quantity in 1..=9999, every unit price ≥ 0
    /// - Discount ≥ 0 and not larger than the subtotal
    pub fn validate(&self) -> CoreResult<()> {
        if self.items.is_empty() {
            return Err(CoreError::EmptySale);
        }
        if self.items.len() > MAX_SALE_LINES {
            return Err(CoreError::TooManyLines {
                max: MAX_SALE_LINES,
            });
        }

        for line in &self.items {
            validate_quantity(line.quantity)?;
            validate_non_negative("unit_price", line.unit_price.cents())?;
        }
        validate_non_negative("discount_amount", self.discount.cents())?;

        let subtotal = self.checked_subtotal()?;
        if self.discount > subtotal {
            return Err(CoreError::DiscountExceedsSubtotal {
                discount: self.discount,
                subtotal,
            });
        }

        Ok(())
    }

    /// Σ line totals (S).
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(SaleLine::line_total).sum()
    }

    /// S − D.
    pub fn total(&self) -> Money {
        self.subtotal() - self.discount
    }

    fn checked_subtotal(&self) -> CoreResult<Money> {
        self.items.iter().try_fold(Money::zero(), |acc, line| {
            acc.checked_add(line.checked_line_total()?)
                .ok_or(CoreError::AmountOverflow)
        })
    }
}

// =============================================================================
// Sale Numbers
// =============================================================================

/// Formats `SALE-YYYY-MM-DD-NNN`.
///
/// The sequence is zero-padded to three digits and simply widens past 999.
///
/// ```rust
/// use chrono::NaiveDate;
/// use kade_core::sale::format_sale_number;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
/// assert_eq!(format_sale_number(day, 1), "SALE-2024-03-05-001");
/// assert_eq!(format_sale_number(day, 1234), "SALE-2024-03-05-1234");
/// ```
pub fn format_sale_number(day: NaiveDate, sequence: i64) -> String {
    format!(
        "{}-{}-{:03}",
        SALE_NUMBER_PREFIX,
        day.format("%Y-%m-%d"),
        sequence
    )
}

/// The store's calendar day at instant `at`.
///
/// Sale numbers and "today" on the dashboard both use this, so a sale rung
/// up at 23:30 local time belongs to that local day even when UTC has
/// already rolled over.
pub fn business_day(at: DateTime<Utc>, utc_offset_minutes: i32) -> NaiveDate {
    (at + Duration::minutes(i64::from(utc_offset_minutes))).date_naive()
}

// =============================================================================
// Unit Tests
// =============================================================================
