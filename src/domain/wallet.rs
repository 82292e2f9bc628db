//! A single user's wallet: spendable and reserved balances.
//!
//! [`Wallet`] holds the pure balance arithmetic; serialization of access
//! belongs to [`super::Ledger`], which keeps each wallet behind its own
//! lock. Both balances are [`Money`] and therefore can never go negative.

use serde::Serialize;
use utoipa::ToSchema;

use super::Money;
use crate::error::EngineError;

/// Balances for one user.
///
/// Invariant: `frozen` equals the sum of `target_price` over this user's
/// monitors with status `Active`. Every mutation below preserves
/// `available + frozen` except [`Wallet::credit`] (deposits) and
/// [`Wallet::settle_from_frozen`] (spends exactly the settlement cost).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Wallet {
    /// Immediately spendable balance.
    pub available: Money,
    /// Reserved-but-unspent balance backing active monitors.
    pub frozen: Money,
}

impl Wallet {
    /// Creates an empty wallet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            available: Money::ZERO,
            frozen: Money::ZERO,
        }
    }

    /// Total funds held for this user.
    #[must_use]
    pub fn total(&self) -> Money {
        self.available
            .checked_add(self.frozen)
            .unwrap_or(Money::new(u64::MAX))
    }

    /// Adds spendable funds (deposit).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRequest`] if the deposit would
    /// overflow the balance.
    pub fn credit(&mut self, amount: Money) -> Result<(), EngineError> {
        self.available = self
            .available
            .checked_add(amount)
            .ok_or_else(|| EngineError::InvalidRequest("deposit overflows balance".to_string()))?;
        Ok(())
    }

    /// Moves `amount` from `available` to `frozen`.
    ///
    /// No partial mutation on failure.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientFunds`] if `available < amount`.
    pub fn reserve(&mut self, amount: Money) -> Result<(), EngineError> {
        let remaining =
            self.available
                .checked_sub(amount)
                .ok_or(EngineError::InsufficientFunds {
                    required: amount,
                    available: self.available,
                })?;
        let frozen = self.frozen.checked_add(amount).ok_or_else(|| {
            EngineError::InvalidRequest("reservation overflows frozen balance".to_string())
        })?;
        self.available = remaining;
        self.frozen = frozen;
        Ok(())
    }

    /// Reverses a reservation without spending it.
    ///
    /// Increments `available` by `amount` and decrements `frozen` by
    /// `min(frozen, amount)` — the frozen side is clamped, never negative.
    /// Returns the amount credited back to `available`.
    pub fn release(&mut self, amount: Money) -> Money {
        self.frozen = self.frozen.saturating_sub(amount);
        self.available = self
            .available
            .checked_add(amount)
            .unwrap_or(Money::new(u64::MAX));
        amount
    }

    /// Spends `cost` out of a `reserved` amount held in `frozen`,
    /// crediting the difference back to `available`.
    ///
    /// Returns the refund (`reserved - cost`).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SettlementInconsistency`] if `cost > reserved`
    /// or `frozen < reserved`; should never occur while callers respect the
    /// reservation bookkeeping, and makes no mutation when it does.
    pub fn settle_from_frozen(
        &mut self,
        reserved: Money,
        cost: Money,
    ) -> Result<Money, EngineError> {
        let refund = reserved
            .checked_sub(cost)
            .ok_or_else(|| EngineError::SettlementInconsistency(format!(
                "cost {cost} exceeds reserved {reserved}"
            )))?;
        let frozen = self
            .frozen
            .checked_sub(reserved)
            .ok_or_else(|| EngineError::SettlementInconsistency(format!(
                "frozen balance {} below reserved {reserved}",
                self.frozen
            )))?;
        let available = self.available.checked_add(refund).ok_or_else(|| {
            EngineError::SettlementInconsistency("refund overflows balance".to_string())
        })?;
        self.frozen = frozen;
        self.available = available;
        Ok(refund)
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn funded(available: u64, frozen: u64) -> Wallet {
        Wallet {
            available: Money::new(available),
            frozen: Money::new(frozen),
        }
    }

    #[test]
    fn reserve_moves_available_to_frozen() {
        let mut w = funded(1000, 0);
        let result = w.reserve(Money::new(300));
        assert!(result.is_ok());
        assert_eq!(w.available, Money::new(700));
        assert_eq!(w.frozen, Money::new(300));
    }

    #[test]
    fn reserve_insufficient_leaves_wallet_untouched() {
        let mut w = funded(100, 50);
        let result = w.reserve(Money::new(300));
        let Err(EngineError::InsufficientFunds {
            required,
            available,
        }) = result
        else {
            panic!("expected InsufficientFunds");
        };
        assert_eq!(required, Money::new(300));
        assert_eq!(available, Money::new(100));
        assert_eq!(w, funded(100, 50));
    }

    #[test]
    fn release_round_trip_restores_balances() {
        let mut w = funded(1000, 0);
        let Ok(()) = w.reserve(Money::new(300)) else {
            panic!("reserve failed");
        };
        w.release(Money::new(300));
        assert_eq!(w, funded(1000, 0));
    }

    #[test]
    fn release_clamps_frozen_at_zero() {
        let mut w = funded(700, 100);
        w.release(Money::new(300));
        assert_eq!(w.frozen, Money::ZERO);
        assert_eq!(w.available, Money::new(1000));
    }

    #[test]
    fn settlement_conserves_money() {
        // reserved = 300, cost = 250: available += 50, frozen -= 300,
        // total drops by exactly the cost.
        let mut w = funded(700, 300);
        let before_total = w.total();
        let refund = w.settle_from_frozen(Money::new(300), Money::new(250));
        assert_eq!(refund.ok(), Some(Money::new(50)));
        assert_eq!(w.available, Money::new(750));
        assert_eq!(w.frozen, Money::ZERO);
        assert_eq!(
            before_total.checked_sub(w.total()),
            Some(Money::new(250))
        );
    }

    #[test]
    fn settle_cost_above_reserved_is_inconsistency() {
        let mut w = funded(700, 300);
        let result = w.settle_from_frozen(Money::new(300), Money::new(350));
        let Err(EngineError::SettlementInconsistency(_)) = result else {
            panic!("expected SettlementInconsistency");
        };
        assert_eq!(w, funded(700, 300));
    }

    #[test]
    fn settle_with_frozen_below_reserved_is_inconsistency() {
        let mut w = funded(700, 100);
        let result = w.settle_from_frozen(Money::new(300), Money::new(250));
        let Err(EngineError::SettlementInconsistency(_)) = result else {
            panic!("expected SettlementInconsistency");
        };
        assert_eq!(w, funded(700, 100));
    }

    #[test]
    fn settle_exact_cost_refunds_nothing() {
        let mut w = funded(0, 300);
        let refund = w.settle_from_frozen(Money::new(300), Money::new(300));
        assert_eq!(refund.ok(), Some(Money::ZERO));
        assert_eq!(w, funded(0, 0));
    }

    #[test]
    fn credit_adds_to_available() {
        let mut w = Wallet::new();
        let Ok(()) = w.credit(Money::new(1000)) else {
            panic!("credit failed");
        };
        assert_eq!(w.available, Money::new(1000));
        assert_eq!(w.frozen, Money::ZERO);
    }
}
