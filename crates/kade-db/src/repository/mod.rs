//! # Repository Module
//!
//! Database repository implementations for Kade POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  axum handler                                                           │
//! │       │                                                                 │
//! │       │  state.db.products().list(&filter)                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                      │
//! │  ├── list(&self, filter)                                                │
//! │  ├── get_by_id(&self, id)                                               │
//! │  ├── create(&self, input)                                               │
//! │  └── update(&self, id, input)                                           │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD and search
//! - [`CustomerRepository`](customer::CustomerRepository) - Customers and loyalty points
//! - [`SaleRepository`](sale::SaleRepository) - The sale transaction, listing, voiding
//! - [`UserRepository`](user::UserRepository) - Staff accounts for login
//! - [`DashboardRepository`](dashboard::DashboardRepository) - Read-only aggregates

use kade_core::BalancePolicy;
use serde::{Deserialize, Serialize};

pub mod customer;
pub mod dashboard;
pub mod product;
pub mod sale;
pub mod user;

/// The two independently configured balance policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancePolicies {
    /// Applied to `products.stock_quantity` when a sale takes stock out.
    pub stock: BalancePolicy,
    /// Applied to `customers.loyalty_points` on adjustments.
    pub loyalty: BalancePolicy,
}

/// Builds `SET <column> = <expr>` and the extra `WHERE` guard that make a
/// single UPDATE honour `policy`. The delta is always bound as `?1`.
///
/// ```text
/// allow   SET x = x + ?1                 (no guard)
/// clamp   SET x = MAX(x + ?1, 0)         (no guard)
/// reject  SET x = x + ?1                 AND x + ?1 >= 0
/// ```
///
/// A rejected change matches zero rows; the caller re-reads the row to tell
/// "missing" from "would go negative".
pub(crate) fn balance_update(policy: BalancePolicy, column: &str) -> (String, String) {
    match policy {
        BalancePolicy::Allow => (format!("{column} = {column} + ?1"), String::new()),
        BalancePolicy::Clamp => (format!("{column} = MAX({column} + ?1, 0)"), String::new()),
        BalancePolicy::Reject => (
            format!("{column} = {column} + ?1"),
            format!(" AND {column} + ?1 >= 0"),
        ),
    }
}

/// `%term%` for a LIKE match, with `%`, `_` and `\` escaped (`ESCAPE '\'`).
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{Database, DbConfig};

    use super::BalancePolicies;

    pub async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn memory_db_with(policies: BalancePolicies) -> Database {
        Database::new(DbConfig::in_memory().policies(policies))
            .await
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rice"), "%rice%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn test_balance_update_sql() {
        let (set, guard) = balance_update(BalancePolicy::Clamp, "stock_quantity");
        assert_eq!(set, "stock_quantity = MAX(stock_quantity + ?1, 0)");
        assert!(guard.is_empty());

        let (_, guard) = balance_update(BalancePolicy::Reject, "loyalty_points");
        assert_eq!(guard, " AND loyalty_points + ?1 >= 0");
    }

    #[test]
    fn test_policies_deserialize_with_defaults() {
        let policies: BalancePolicies = serde_json::from_str(r#"{"stock":"reject"}"#).unwrap();
        assert_eq!(policies.stock, BalancePolicy::Reject);
        assert_eq!(policies.loyalty, BalancePolicy::Allow);
    }
}
