//! # Validation Module
//!
//! Input validation utilities for Kade POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end (TypeScript)                                        │
//! │  └── Basic format checks, immediate feedback                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                           │
//! │  ├── Type validation (JSON deserialization → 400)                       │
//! │  └── THIS MODULE: business rules (→ 400)                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── NOT NULL / CHECK constraints                                       │
//! │  ├── UNIQUE constraints (barcode, email, sale_number)                   │
//! │  └── Foreign key constraints                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kade_core::validation::{validate_barcode, validate_quantity};
//!
//! validate_barcode("RICE001").unwrap();
//! validate_quantity(3).unwrap();
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::{MAX_BALANCE_DELTA, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted name (products, customers).
pub const MAX_NAME_LEN: usize = 200;

/// Longest accepted barcode.
pub const MAX_BARCODE_LEN: usize = 50;

/// Longest accepted search string.
pub const MAX_SEARCH_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Trims an optional string and maps blank values to `None`.
///
/// ```rust
/// use kade_core::validation::normalize_optional;
///
/// assert_eq!(normalize_optional(Some("  ".into())), None);
/// assert_eq!(normalize_optional(Some(" RICE001 ".into())), Some("RICE001".into()));
/// assert_eq!(normalize_optional(None), None);
/// ```
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == v.len() {
            Some(v)
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Validates a required display name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a barcode.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only ASCII letters, digits, hyphens and underscores
///
/// ## Example
/// ```rust
/// use kade_core::validation::validate_barcode;
///
/// assert!(validate_barcode("RICE001").is_ok());
/// assert!(validate_barcode("4791234567890").is_ok());
/// assert!(validate_barcode("").is_err());
/// assert!(validate_barcode("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.len() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    if !barcode
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Loose email check: one `@` with something on both sides and a dot in
/// the domain. Deliverability is not our problem.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@example.com".to_string(),
    };

    let (local, domain) = email.trim().split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query, or `None` when blank (no filter).
pub fn validate_search_query(query: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
        return Ok(None);
    };

    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok(Some(query.to_string()))
}

/// Parses a `YYYY-MM-DD` query parameter.
pub fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        }
    })
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed MAX_ITEM_QUANTITY (9999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a signed adjustment to a stored balance (stock, points).
///
/// ## Rules
/// - `|delta|` must not exceed MAX_BALANCE_DELTA
///
/// ```rust
/// use kade_core::validation::validate_balance_delta;
///
/// assert!(validate_balance_delta("delta", -150).is_ok());
/// assert!(validate_balance_delta("delta", i64::MAX).is_err());
/// assert!(validate_balance_delta("delta", i64::MIN).is_err());
/// ```
pub fn validate_balance_delta(field: &str, delta: i64) -> ValidationResult<()> {
    if !(-MAX_BALANCE_DELTA..=MAX_BALANCE_DELTA).contains(&delta) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: -MAX_BALANCE_DELTA,
            max: MAX_BALANCE_DELTA,
        });
    }

    Ok(())
}

/// Validates that an amount or count is zero or more.
///
/// ## Example
/// ```rust
/// use kade_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("price", 1099).is_ok());
/// assert!(validate_non_negative("price", 0).is_ok());     // Free item
/// assert!(validate_non_negative("price", -100).is_err());
/// ```
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("RICE001").is_ok());
        assert!(validate_barcode("BLEACH001").is_ok());
        assert!(validate_barcode("item_1-b").is_ok());

        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("   ").is_err());
        assert!(validate_barcode("has space").is_err());
        assert!(validate_barcode("කඩේ").is_err());
        assert!(validate_barcode(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Coconut Oil").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(201)).is_err());
        assert!(validate_name("name", &"A".repeat(200)).is_ok());

        let err = validate_name("name", " ").unwrap_err();
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("john@example.com").is_ok());
        assert!(validate_email("admin@pos.com").is_ok());

        assert!(validate_email("john").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("john@localhost").is_err());
        assert!(validate_email("john@.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(9999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(10_000).is_err());
    }

    #[test]
    fn test_validate_balance_delta() {
        assert!(validate_balance_delta("points", 0).is_ok());
        assert!(validate_balance_delta("points", MAX_BALANCE_DELTA).is_ok());
        assert!(validate_balance_delta("points", -MAX_BALANCE_DELTA).is_ok());
        assert!(validate_balance_delta("points", MAX_BALANCE_DELTA + 1).is_err());

        let err = validate_balance_delta("delta", i64::MIN).unwrap_err();
        assert_eq!(
            err.to_string(),
            "delta must be between -1000000000 and 1000000000"
        );
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query(None).unwrap(), None);
        assert_eq!(validate_search_query(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_search_query(Some(" rice ")).unwrap().as_deref(),
            Some("rice")
        );
        assert!(validate_search_query(Some(&"x".repeat(101))).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("date", "2024-03-05").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
        assert!(parse_date("date", "05/03/2024").is_err());
        assert!(parse_date("date", "2024-02-30").is_err());
    }
}
