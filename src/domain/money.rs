//! Monetary amounts in integer minor units.
//!
//! [`Money`] is a newtype over `u64` minor units (e.g. cents). Balances
//! can never go negative by construction: all arithmetic is checked or
//! explicitly clamped at the call site.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A monetary amount in minor units.
///
/// Serialized as a bare JSON number. Used for wallet balances, target
/// prices, and order totals throughout the engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from minor units.
    #[must_use]
    pub const fn new(minor_units: u64) -> Self {
        Self(minor_units)
    }

    /// Returns the amount in minor units.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns `true` if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition; `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction; `None` if `other > self`.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Subtraction clamped at zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Signed difference `self - other`, for reservation adjustments.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn signed_delta(self, other: Self) -> i64 {
        self.0 as i64 - other.0 as i64
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Money {
    fn from(minor_units: u64) -> Self {
        Self(minor_units)
    }
}

impl From<Money> for u64 {
    fn from(m: Money) -> Self {
        m.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn checked_sub_underflow_is_none() {
        let a = Money::new(100);
        let b = Money::new(300);
        assert_eq!(a.checked_sub(b), None);
        assert_eq!(b.checked_sub(a), Some(Money::new(200)));
    }

    #[test]
    fn saturating_sub_clamps_at_zero() {
        let a = Money::new(100);
        let b = Money::new(300);
        assert_eq!(a.saturating_sub(b), Money::ZERO);
    }

    #[test]
    fn signed_delta_both_directions() {
        let old = Money::new(300);
        let new = Money::new(500);
        assert_eq!(new.signed_delta(old), 200);
        assert_eq!(old.signed_delta(new), -200);
        assert_eq!(old.signed_delta(old), 0);
    }

    #[test]
    fn serde_is_transparent() {
        let m = Money::new(12345);
        let json = serde_json::to_string(&m).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert_eq!(json, "12345");
        let back: Option<Money> = serde_json::from_str(&json).ok();
        assert_eq!(back, Some(m));
    }

    #[test]
    fn display_is_minor_units() {
        assert_eq!(format!("{}", Money::new(250)), "250");
    }
}
