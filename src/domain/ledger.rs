//! Wallet store with per-wallet fine-grained locking.
//!
//! [`Ledger`] keeps every user's [`Wallet`] behind its own
//! [`tokio::sync::RwLock`], so operations on one wallet are linearizable
//! with respect to each other while different users' wallets proceed
//! concurrently. All balance mutations in the engine go through this type;
//! nothing else may touch `available`/`frozen`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{Money, UserId, Wallet};
use crate::error::EngineError;

/// Central store for all user wallets.
///
/// # Concurrency
///
/// - Reads of the same wallet are concurrent.
/// - Mutations of different wallets are concurrent.
/// - Mutations of the same wallet are serialized: each read-modify-write
///   happens under that wallet's write lock, so two racing reservations
///   can never both observe the same `available` balance.
#[derive(Debug)]
pub struct Ledger {
    wallets: RwLock<HashMap<UserId, Arc<RwLock<Wallet>>>>,
}

impl Ledger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            wallets: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the wallet lock for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::WalletNotFound`] if the user has no wallet.
    async fn wallet(&self, user_id: UserId) -> Result<Arc<RwLock<Wallet>>, EngineError> {
        let map = self.wallets.read().await;
        map.get(&user_id)
            .cloned()
            .ok_or(EngineError::WalletNotFound(*user_id.as_uuid()))
    }

    /// Returns the wallet lock for `user_id`, creating an empty wallet on
    /// first use.
    async fn wallet_or_create(&self, user_id: UserId) -> Arc<RwLock<Wallet>> {
        {
            let map = self.wallets.read().await;
            if let Some(entry) = map.get(&user_id) {
                return Arc::clone(entry);
            }
        }
        let mut map = self.wallets.write().await;
        Arc::clone(
            map.entry(user_id)
                .or_insert_with(|| Arc::new(RwLock::new(Wallet::new()))),
        )
    }

    /// Deposits spendable funds, creating the wallet if needed.
    ///
    /// Returns the wallet state after the deposit.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRequest`] on a zero deposit or
    /// balance overflow.
    pub async fn credit(&self, user_id: UserId, amount: Money) -> Result<Wallet, EngineError> {
        if amount.is_zero() {
            return Err(EngineError::InvalidRequest(
                "deposit amount must be positive".to_string(),
            ));
        }
        let lock = self.wallet_or_create(user_id).await;
        let mut wallet = lock.write().await;
        wallet.credit(amount)?;
        tracing::info!(%user_id, %amount, "wallet credited");
        Ok(*wallet)
    }

    /// Atomically moves `amount` from `available` to `frozen`.
    ///
    /// No partial mutation on failure.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidRequest`] if `amount` is zero.
    /// - [`EngineError::WalletNotFound`] if the user has no wallet.
    /// - [`EngineError::InsufficientFunds`] if `available < amount`.
    pub async fn reserve(&self, user_id: UserId, amount: Money) -> Result<(), EngineError> {
        if amount.is_zero() {
            return Err(EngineError::InvalidRequest(
                "reservation amount must be positive".to_string(),
            ));
        }
        let lock = self.wallet(user_id).await?;
        let mut wallet = lock.write().await;
        wallet.reserve(amount)
    }

    /// Reverses a reservation: `frozen` decreases (clamped at zero) and
    /// `available` increases by `amount`.
    ///
    /// Returns the amount credited back.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::WalletNotFound`] if the user has no wallet.
    pub async fn release(&self, user_id: UserId, amount: Money) -> Result<Money, EngineError> {
        let lock = self.wallet(user_id).await?;
        let mut wallet = lock.write().await;
        Ok(wallet.release(amount))
    }

    /// Spends `cost` out of a `reserved` amount held in `frozen` and
    /// refunds the difference to `available`.
    ///
    /// Returns the refund (`reserved - cost`).
    ///
    /// # Errors
    ///
    /// - [`EngineError::WalletNotFound`] if the user has no wallet
    ///   (deleted account; callers treat this as a recoverable skip).
    /// - [`EngineError::SettlementInconsistency`] if the wallet state
    ///   contradicts the reservation bookkeeping; no mutation occurs.
    pub async fn settle_from_frozen(
        &self,
        user_id: UserId,
        reserved: Money,
        cost: Money,
    ) -> Result<Money, EngineError> {
        let lock = self.wallet(user_id).await?;
        let mut wallet = lock.write().await;
        wallet.settle_from_frozen(reserved, cost)
    }

    /// Adjusts a reservation by a signed delta, for target-price edits.
    ///
    /// A positive delta behaves like [`Ledger::reserve`]; a negative delta
    /// like [`Ledger::release`]; zero is a no-op.
    ///
    /// # Errors
    ///
    /// - [`EngineError::WalletNotFound`] if the user has no wallet.
    /// - [`EngineError::InsufficientFunds`] if the delta is positive and
    ///   `available < delta`; balances are left unchanged.
    pub async fn adjust_reservation(
        &self,
        user_id: UserId,
        delta: i64,
    ) -> Result<(), EngineError> {
        match delta {
            0 => Ok(()),
            #[allow(clippy::cast_sign_loss)]
            d if d > 0 => self.reserve(user_id, Money::new(d as u64)).await,
            #[allow(clippy::cast_sign_loss)]
            d => {
                self.release(user_id, Money::new(d.unsigned_abs())).await?;
                Ok(())
            }
        }
    }

    /// Returns a point-in-time copy of the user's balances.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::WalletNotFound`] if the user has no wallet.
    pub async fn balance(&self, user_id: UserId) -> Result<Wallet, EngineError> {
        let lock = self.wallet(user_id).await?;
        let wallet = lock.read().await;
        Ok(*wallet)
    }

    /// Returns the number of wallets in the ledger.
    pub async fn len(&self) -> usize {
        self.wallets.read().await.len()
    }

    /// Returns `true` if no wallets exist.
    pub async fn is_empty(&self) -> bool {
        self.wallets.read().await.is_empty()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    async fn funded_ledger(user: UserId, amount: u64) -> Ledger {
        let ledger = Ledger::new();
        let Ok(_) = ledger.credit(user, Money::new(amount)).await else {
            panic!("credit failed");
        };
        ledger
    }

    #[tokio::test]
    async fn reserve_without_wallet_is_not_found() {
        let ledger = Ledger::new();
        let result = ledger.reserve(UserId::new(), Money::new(100)).await;
        let Err(EngineError::WalletNotFound(_)) = result else {
            panic!("expected WalletNotFound");
        };
    }

    #[tokio::test]
    async fn credit_creates_wallet_implicitly() {
        let ledger = Ledger::new();
        let user = UserId::new();
        assert!(ledger.is_empty().await);

        let wallet = ledger.credit(user, Money::new(1000)).await;
        assert_eq!(
            wallet.ok().map(|w| w.available),
            Some(Money::new(1000))
        );
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn zero_reserve_is_rejected() {
        let user = UserId::new();
        let ledger = funded_ledger(user, 1000).await;
        let result = ledger.reserve(user, Money::ZERO).await;
        let Err(EngineError::InvalidRequest(_)) = result else {
            panic!("expected InvalidRequest");
        };
    }

    #[tokio::test]
    async fn reserve_then_release_round_trips() {
        let user = UserId::new();
        let ledger = funded_ledger(user, 1000).await;

        let Ok(()) = ledger.reserve(user, Money::new(300)) .await else {
            panic!("reserve failed");
        };
        let mid = ledger.balance(user).await;
        assert_eq!(
            mid.ok(),
            Some(Wallet {
                available: Money::new(700),
                frozen: Money::new(300)
            })
        );

        let Ok(released) = ledger.release(user, Money::new(300)).await else {
            panic!("release failed");
        };
        assert_eq!(released, Money::new(300));
        let after = ledger.balance(user).await;
        assert_eq!(
            after.ok(),
            Some(Wallet {
                available: Money::new(1000),
                frozen: Money::ZERO
            })
        );
    }

    #[tokio::test]
    async fn adjust_reservation_up_requires_funds() {
        let user = UserId::new();
        let ledger = funded_ledger(user, 100).await;
        let Ok(()) = ledger.reserve(user, Money::new(50)).await else {
            panic!("reserve failed");
        };

        let result = ledger.adjust_reservation(user, 200).await;
        let Err(EngineError::InsufficientFunds { .. }) = result else {
            panic!("expected InsufficientFunds");
        };
        // Failed increase leaves both balances unchanged.
        let wallet = ledger.balance(user).await;
        assert_eq!(
            wallet.ok(),
            Some(Wallet {
                available: Money::new(50),
                frozen: Money::new(50)
            })
        );
    }

    #[tokio::test]
    async fn adjust_reservation_down_releases() {
        let user = UserId::new();
        let ledger = funded_ledger(user, 1000).await;
        let Ok(()) = ledger.reserve(user, Money::new(400)).await else {
            panic!("reserve failed");
        };

        let Ok(()) = ledger.adjust_reservation(user, -150).await else {
            panic!("adjust failed");
        };
        let wallet = ledger.balance(user).await;
        assert_eq!(
            wallet.ok(),
            Some(Wallet {
                available: Money::new(750),
                frozen: Money::new(250)
            })
        );
    }

    #[tokio::test]
    async fn settle_missing_wallet_is_not_found() {
        let ledger = Ledger::new();
        let result = ledger
            .settle_from_frozen(UserId::new(), Money::new(300), Money::new(250))
            .await;
        let Err(EngineError::WalletNotFound(_)) = result else {
            panic!("expected WalletNotFound");
        };
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reserves_never_oversubscribe() {
        let user = UserId::new();
        let ledger = Arc::new(funded_ledger(user, 500).await);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                ledger.reserve(user, Money::new(100)).await.is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            let Ok(ok) = handle.await else {
                panic!("task panicked");
            };
            if ok {
                successes += 1;
            }
        }

        // Exactly five 100-unit reservations fit in 500.
        assert_eq!(successes, 5);
        let wallet = ledger.balance(user).await;
        assert_eq!(
            wallet.ok(),
            Some(Wallet {
                available: Money::ZERO,
                frozen: Money::new(500)
            })
        );
    }
}
