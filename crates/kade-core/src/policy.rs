//! # Balance Policy
//!
//! What happens when a stock quantity or a loyalty balance would drop below
//! zero.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  balance = 3, delta = -5                                                │
//! │                                                                         │
//! │  allow   →  -2        (the change is applied as-is)                     │
//! │  clamp   →   0        (floored at zero)                                 │
//! │  reject  →   3        (refused: InsufficientStock / InsufficientPoints) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Configured separately for product stock and for loyalty points. The
//! database layer turns each variant into a single UPDATE statement; the
//! arithmetic here is the reference for that SQL and for the tests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum BalancePolicy {
    /// Apply the delta; the balance may go negative.
    #[default]
    Allow,
    /// Apply the delta but never go below zero.
    Clamp,
    /// Refuse any change that would leave the balance below zero.
    Reject,
}

impl BalancePolicy {
    pub const ALL: [BalancePolicy; 3] =
        [BalancePolicy::Allow, BalancePolicy::Clamp, BalancePolicy::Reject];

    /// Returns the new balance, or `None` if the policy refuses the change.
    ///
    /// ```rust
    /// use kade_core::BalancePolicy;
    ///
    /// assert_eq!(BalancePolicy::Allow.apply(3, -5), Some(-2));
    /// assert_eq!(BalancePolicy::Clamp.apply(3, -5), Some(0));
    /// assert_eq!(BalancePolicy::Reject.apply(3, -5), None);
    /// ```
    pub fn apply(self, balance: i64, delta: i64) -> Option<i64> {
        let next = balance.saturating_add(delta);
        match self {
            BalancePolicy::Allow => Some(next),
            BalancePolicy::Clamp => Some(next.max(0)),
            BalancePolicy::Reject if next < 0 => None,
            BalancePolicy::Reject => Some(next),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BalancePolicy::Allow => "allow",
            BalancePolicy::Clamp => "clamp",
            BalancePolicy::Reject => "reject",
        }
    }
}

impl fmt::Display for BalancePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BalancePolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(BalancePolicy::Allow),
            "clamp" => Ok(BalancePolicy::Clamp),
            "reject" => Ok(BalancePolicy::Reject),
            _ => Err(ValidationError::NotAllowed {
                field: "policy".to_string(),
                allowed: BalancePolicy::ALL.iter().map(|p| p.to_string()).collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_deltas_always_apply() {
        for policy in BalancePolicy::ALL {
            assert_eq!(policy.apply(-4, 10), Some(6));
            assert_eq!(policy.apply(0, 0), Some(0));
        }
    }

    #[test]
    fn test_exact_zero_is_accepted() {
        assert_eq!(BalancePolicy::Reject.apply(5, -5), Some(0));
        assert_eq!(BalancePolicy::Clamp.apply(5, -5), Some(0));
    }

    #[test]
    fn test_clamp_keeps_existing_negative_floor() {
        // A balance that went negative under `allow` is floored on the next change.
        assert_eq!(BalancePolicy::Clamp.apply(-3, -1), Some(0));
        assert_eq!(BalancePolicy::Reject.apply(-3, 1), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("allow".parse::<BalancePolicy>().unwrap(), BalancePolicy::Allow);
        assert_eq!(" Clamp ".parse::<BalancePolicy>().unwrap(), BalancePolicy::Clamp);
        assert_eq!("REJECT".parse::<BalancePolicy>().unwrap(), BalancePolicy::Reject);

        let err = "never".parse::<BalancePolicy>().unwrap_err();
        assert_eq!(err.to_string(), "policy must be one of: allow, clamp, reject");
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&BalancePolicy::Reject).unwrap(), "\"reject\"");
        let parsed: BalancePolicy = serde_json::from_str("\"clamp\"").unwrap();
        assert_eq!(parsed, BalancePolicy::Clamp);
        assert_eq!(BalancePolicy::default(), BalancePolicy::Allow);
    }
}
