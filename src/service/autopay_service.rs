//! Auto-purchase service: user-facing monitor and wallet operations.
//!
//! Orchestrates the [`Ledger`] and [`MonitorRegistry`] so that their
//! combined invariant holds at every return point: a user's frozen
//! balance equals the sum of targets over their active monitors. Every
//! mutation follows the pattern: acquire lock → mutate ledger + monitor →
//! emit event → return result.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    EngineEvent, EventBus, Ledger, Money, Monitor, MonitorId, MonitorRegistry, Order, OrderStore,
    PriceChangeLog, PriceChangeRecord, ProductSnapshot, UserId, Wallet,
};
use crate::error::EngineError;

/// Orchestration layer for monitor lifecycle and wallet operations.
///
/// Stateless coordinator: owns shared handles to the domain stores and
/// the [`EventBus`]. Constructed once at process start and injected into
/// request handlers.
#[derive(Debug, Clone)]
pub struct AutopayService {
    ledger: Arc<Ledger>,
    registry: Arc<MonitorRegistry>,
    orders: Arc<OrderStore>,
    price_log: Arc<PriceChangeLog>,
    event_bus: EventBus,
}

impl AutopayService {
    /// Creates a new `AutopayService` over shared domain stores.
    #[must_use]
    pub fn new(
        ledger: Arc<Ledger>,
        registry: Arc<MonitorRegistry>,
        orders: Arc<OrderStore>,
        price_log: Arc<PriceChangeLog>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            ledger,
            registry,
            orders,
            price_log,
            event_bus,
        }
    }

    /// Returns a reference to the inner [`Ledger`].
    #[must_use]
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Returns a reference to the inner [`MonitorRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<MonitorRegistry> {
        &self.registry
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Creates a monitor, reserving `target_price` from the user's wallet.
    ///
    /// Reservation happens first; if it fails, no monitor is created and
    /// no state changes.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidRequest`] on a non-positive target or an
    ///   empty delivery address.
    /// - [`EngineError::WalletNotFound`] if the user has no wallet.
    /// - [`EngineError::InsufficientFunds`] if `available < target_price`.
    pub async fn create_monitor(
        &self,
        user_id: UserId,
        snapshot: ProductSnapshot,
        target_price: Money,
        max_price: Option<Money>,
        delivery_address: String,
    ) -> Result<Monitor, EngineError> {
        if target_price.is_zero() {
            return Err(EngineError::InvalidRequest(
                "target price must be positive".to_string(),
            ));
        }
        if delivery_address.trim().is_empty() {
            return Err(EngineError::InvalidRequest(
                "delivery address is required".to_string(),
            ));
        }

        self.ledger.reserve(user_id, target_price).await?;

        let monitor = Monitor::new(
            user_id,
            snapshot,
            target_price,
            max_price.unwrap_or(target_price),
            delivery_address,
        );
        let created = monitor.clone();

        if let Err(e) = self.registry.insert(monitor).await {
            // Undo the reservation so the wallet invariant holds.
            let _ = self.ledger.release(user_id, target_price).await;
            return Err(e);
        }

        let _ = self.event_bus.publish(EngineEvent::MonitorCreated {
            monitor_id: created.id,
            user_id,
            product_id: created.product_id.clone(),
            target_price,
            timestamp: Utc::now(),
        });

        tracing::info!(
            monitor_id = %created.id,
            %user_id,
            product_id = %created.product_id,
            %target_price,
            "monitor created"
        );
        Ok(created)
    }

    /// Cancels a monitor, releasing its reservation if it was active.
    ///
    /// Cancelling an already-closed monitor is a success no-op.
    ///
    /// # Errors
    ///
    /// - [`EngineError::MonitorNotFound`] if no monitor with the id exists.
    /// - [`EngineError::Forbidden`] if `requesting_user` does not own it.
    pub async fn cancel_monitor(
        &self,
        monitor_id: MonitorId,
        requesting_user: UserId,
    ) -> Result<Monitor, EngineError> {
        let entry = self.registry.get(monitor_id).await?;
        let mut monitor = entry.write().await;

        if monitor.user_id != requesting_user {
            return Err(EngineError::Forbidden(*monitor_id.as_uuid()));
        }

        if monitor.is_active() {
            // Release tolerates a missing wallet: a deleted account must
            // not leave the monitor stuck in `Active`.
            match self.ledger.release(monitor.user_id, monitor.target_price).await {
                Ok(released) => {
                    let _ = self.event_bus.publish(EngineEvent::MonitorCancelled {
                        monitor_id,
                        user_id: monitor.user_id,
                        released,
                        timestamp: Utc::now(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        %monitor_id,
                        user_id = %monitor.user_id,
                        error = %e,
                        "cancel: reservation release failed, closing monitor anyway"
                    );
                }
            }
            monitor.mark_cancelled();
            tracing::info!(%monitor_id, user_id = %monitor.user_id, "monitor cancelled");
        }

        Ok(monitor.clone())
    }

    /// Updates a monitor's target price, adjusting the reservation by the
    /// delta. An increase that the wallet cannot cover fails and leaves
    /// target, available, and frozen unchanged.
    ///
    /// # Errors
    ///
    /// - [`EngineError::MonitorNotFound`] / [`EngineError::Forbidden`] as
    ///   for cancellation.
    /// - [`EngineError::InvalidRequest`] on a non-positive target or a
    ///   non-active monitor.
    /// - [`EngineError::InsufficientFunds`] if the increase exceeds the
    ///   spendable balance.
    pub async fn update_target(
        &self,
        monitor_id: MonitorId,
        requesting_user: UserId,
        new_target: Money,
    ) -> Result<Monitor, EngineError> {
        if new_target.is_zero() {
            return Err(EngineError::InvalidRequest(
                "target price must be positive".to_string(),
            ));
        }

        let entry = self.registry.get(monitor_id).await?;
        let mut monitor = entry.write().await;

        if monitor.user_id != requesting_user {
            return Err(EngineError::Forbidden(*monitor_id.as_uuid()));
        }
        if !monitor.is_active() {
            return Err(EngineError::InvalidRequest(
                "only active monitors can be edited".to_string(),
            ));
        }

        let old_target = monitor.target_price;
        let delta = new_target.signed_delta(old_target);
        self.ledger
            .adjust_reservation(monitor.user_id, delta)
            .await?;
        monitor.target_price = new_target;

        let _ = self.event_bus.publish(EngineEvent::TargetUpdated {
            monitor_id,
            user_id: monitor.user_id,
            old_target,
            new_target,
            timestamp: Utc::now(),
        });

        tracing::info!(
            %monitor_id,
            user_id = %monitor.user_id,
            %old_target,
            %new_target,
            "target price updated"
        );
        Ok(monitor.clone())
    }

    /// Deposits spendable funds into the user's wallet, creating it on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRequest`] on a zero deposit.
    pub async fn deposit(&self, user_id: UserId, amount: Money) -> Result<Wallet, EngineError> {
        let wallet = self.ledger.credit(user_id, amount).await?;
        let _ = self.event_bus.publish(EngineEvent::WalletCredited {
            user_id,
            amount,
            timestamp: Utc::now(),
        });
        Ok(wallet)
    }

    /// Returns the user's wallet balances.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::WalletNotFound`] if the user has no wallet.
    pub async fn wallet(&self, user_id: UserId) -> Result<Wallet, EngineError> {
        self.ledger.balance(user_id).await
    }

    /// Returns the user's active monitors, newest first.
    pub async fn list_active(&self, user_id: UserId) -> Vec<Monitor> {
        self.registry.list_active(user_id).await
    }

    /// Returns the user's purchased monitors, most recent purchase first.
    pub async fn list_purchased(&self, user_id: UserId) -> Vec<Monitor> {
        self.registry.list_purchased(user_id).await
    }

    /// Returns the user's emitted orders, newest first.
    pub async fn list_orders(&self, user_id: UserId) -> Vec<Order> {
        self.orders.list_for_user(user_id).await
    }

    /// Returns up to `limit` recent price changes, newest first.
    pub async fn recent_price_changes(&self, limit: usize) -> Vec<PriceChangeRecord> {
        self.price_log.recent(limit).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{MonitorStatus, ProductId};

    fn snapshot(price: u64) -> ProductSnapshot {
        ProductSnapshot {
            product_id: ProductId::new("prod-1"),
            product_name: "Linen Shirt".to_string(),
            product_image: "/images/linen-shirt.jpg".to_string(),
            price: Money::new(price),
        }
    }

    fn make_service() -> AutopayService {
        AutopayService::new(
            Arc::new(Ledger::new()),
            Arc::new(MonitorRegistry::new()),
            Arc::new(OrderStore::new()),
            Arc::new(PriceChangeLog::new()),
            EventBus::new(100),
        )
    }

    async fn fund(service: &AutopayService, user: UserId, amount: u64) {
        let Ok(_) = service.deposit(user, Money::new(amount)).await else {
            panic!("deposit failed");
        };
    }

    async fn wallet_of(service: &AutopayService, user: UserId) -> Wallet {
        let Ok(wallet) = service.wallet(user).await else {
            panic!("wallet missing");
        };
        wallet
    }

    #[tokio::test]
    async fn create_reserves_target_and_activates() {
        // Scenario A: available 1000, create target 300.
        let service = make_service();
        let user = UserId::new();
        fund(&service, user, 1000).await;

        let monitor = service
            .create_monitor(
                user,
                snapshot(500),
                Money::new(300),
                None,
                "12 North Lane".to_string(),
            )
            .await;
        let Ok(monitor) = monitor else {
            panic!("create failed");
        };
        assert_eq!(monitor.status, MonitorStatus::Active);
        assert_eq!(monitor.max_price, Money::new(300));

        let wallet = wallet_of(&service, user).await;
        assert_eq!(wallet.available, Money::new(700));
        assert_eq!(wallet.frozen, Money::new(300));
    }

    #[tokio::test]
    async fn create_with_insufficient_funds_leaves_no_trace() {
        let service = make_service();
        let user = UserId::new();
        fund(&service, user, 100).await;

        let result = service
            .create_monitor(
                user,
                snapshot(500),
                Money::new(300),
                None,
                "12 North Lane".to_string(),
            )
            .await;
        let Err(EngineError::InsufficientFunds { .. }) = result else {
            panic!("expected InsufficientFunds");
        };

        assert!(service.registry().is_empty().await);
        let wallet = wallet_of(&service, user).await;
        assert_eq!(wallet.available, Money::new(100));
        assert_eq!(wallet.frozen, Money::ZERO);
    }

    #[tokio::test]
    async fn create_without_wallet_fails() {
        let service = make_service();
        let result = service
            .create_monitor(
                UserId::new(),
                snapshot(500),
                Money::new(300),
                None,
                "12 North Lane".to_string(),
            )
            .await;
        let Err(EngineError::WalletNotFound(_)) = result else {
            panic!("expected WalletNotFound");
        };
    }

    #[tokio::test]
    async fn cancel_restores_balances() {
        // Scenario D: cancel with target 300, available 700, frozen 300.
        let service = make_service();
        let user = UserId::new();
        fund(&service, user, 1000).await;
        let Ok(monitor) = service
            .create_monitor(
                user,
                snapshot(500),
                Money::new(300),
                None,
                "12 North Lane".to_string(),
            )
            .await
        else {
            panic!("create failed");
        };

        let cancelled = service.cancel_monitor(monitor.id, user).await;
        assert_eq!(
            cancelled.ok().map(|m| m.status),
            Some(MonitorStatus::Cancelled)
        );

        let wallet = wallet_of(&service, user).await;
        assert_eq!(wallet.available, Money::new(1000));
        assert_eq!(wallet.frozen, Money::ZERO);
    }

    #[tokio::test]
    async fn cancel_by_non_owner_is_forbidden() {
        let service = make_service();
        let user = UserId::new();
        fund(&service, user, 1000).await;
        let Ok(monitor) = service
            .create_monitor(
                user,
                snapshot(500),
                Money::new(300),
                None,
                "12 North Lane".to_string(),
            )
            .await
        else {
            panic!("create failed");
        };

        let result = service.cancel_monitor(monitor.id, UserId::new()).await;
        let Err(EngineError::Forbidden(_)) = result else {
            panic!("expected Forbidden");
        };
        // Reservation untouched.
        let wallet = wallet_of(&service, user).await;
        assert_eq!(wallet.frozen, Money::new(300));
    }

    #[tokio::test]
    async fn cancel_twice_is_a_noop_success() {
        let service = make_service();
        let user = UserId::new();
        fund(&service, user, 1000).await;
        let Ok(monitor) = service
            .create_monitor(
                user,
                snapshot(500),
                Money::new(300),
                None,
                "12 North Lane".to_string(),
            )
            .await
        else {
            panic!("create failed");
        };

        let Ok(_) = service.cancel_monitor(monitor.id, user).await else {
            panic!("first cancel failed");
        };
        let Ok(_) = service.cancel_monitor(monitor.id, user).await else {
            panic!("second cancel should be a no-op success");
        };

        // Funds released exactly once.
        let wallet = wallet_of(&service, user).await;
        assert_eq!(wallet.available, Money::new(1000));
        assert_eq!(wallet.frozen, Money::ZERO);
    }

    #[tokio::test]
    async fn target_increase_moves_reservation() {
        let service = make_service();
        let user = UserId::new();
        fund(&service, user, 1000).await;
        let Ok(monitor) = service
            .create_monitor(
                user,
                snapshot(500),
                Money::new(300),
                None,
                "12 North Lane".to_string(),
            )
            .await
        else {
            panic!("create failed");
        };

        let updated = service
            .update_target(monitor.id, user, Money::new(450))
            .await;
        assert_eq!(
            updated.ok().map(|m| m.target_price),
            Some(Money::new(450))
        );

        let wallet = wallet_of(&service, user).await;
        assert_eq!(wallet.available, Money::new(550));
        assert_eq!(wallet.frozen, Money::new(450));
    }

    #[tokio::test]
    async fn target_increase_without_funds_changes_nothing() {
        let service = make_service();
        let user = UserId::new();
        fund(&service, user, 400).await;
        let Ok(monitor) = service
            .create_monitor(
                user,
                snapshot(500),
                Money::new(300),
                None,
                "12 North Lane".to_string(),
            )
            .await
        else {
            panic!("create failed");
        };

        // Raising by 200 needs 200 available; only 100 remains.
        let result = service
            .update_target(monitor.id, user, Money::new(500))
            .await;
        let Err(EngineError::InsufficientFunds { .. }) = result else {
            panic!("expected InsufficientFunds");
        };

        let entry = service.registry().get(monitor.id).await;
        let Ok(entry) = entry else {
            panic!("monitor missing");
        };
        assert_eq!(entry.read().await.target_price, Money::new(300));
        let wallet = wallet_of(&service, user).await;
        assert_eq!(wallet.available, Money::new(100));
        assert_eq!(wallet.frozen, Money::new(300));
    }

    #[tokio::test]
    async fn target_decrease_refunds_difference() {
        let service = make_service();
        let user = UserId::new();
        fund(&service, user, 1000).await;
        let Ok(monitor) = service
            .create_monitor(
                user,
                snapshot(500),
                Money::new(300),
                None,
                "12 North Lane".to_string(),
            )
            .await
        else {
            panic!("create failed");
        };

        let Ok(_) = service
            .update_target(monitor.id, user, Money::new(200))
            .await
        else {
            panic!("update failed");
        };
        let wallet = wallet_of(&service, user).await;
        assert_eq!(wallet.available, Money::new(800));
        assert_eq!(wallet.frozen, Money::new(200));
    }

    #[tokio::test]
    async fn frozen_always_equals_sum_of_active_targets() {
        let service = make_service();
        let user = UserId::new();
        fund(&service, user, 2000).await;

        let Ok(first) = service
            .create_monitor(
                user,
                snapshot(500),
                Money::new(300),
                None,
                "12 North Lane".to_string(),
            )
            .await
        else {
            panic!("create failed");
        };
        let Ok(_second) = service
            .create_monitor(
                user,
                snapshot(800),
                Money::new(600),
                None,
                "12 North Lane".to_string(),
            )
            .await
        else {
            panic!("create failed");
        };

        let wallet = wallet_of(&service, user).await;
        assert_eq!(wallet.frozen, service.registry().reserved_total(user).await);

        let Ok(_) = service.update_target(first.id, user, Money::new(450)).await else {
            panic!("update failed");
        };
        let wallet = wallet_of(&service, user).await;
        assert_eq!(wallet.frozen, service.registry().reserved_total(user).await);

        let Ok(_) = service.cancel_monitor(first.id, user).await else {
            panic!("cancel failed");
        };
        let wallet = wallet_of(&service, user).await;
        assert_eq!(wallet.frozen, service.registry().reserved_total(user).await);
    }

    #[tokio::test]
    async fn create_emits_event() {
        let service = make_service();
        let mut rx = service.event_bus().subscribe();
        let user = UserId::new();
        fund(&service, user, 1000).await;
        // Drain the WalletCredited event.
        let _ = rx.recv().await;

        let Ok(_) = service
            .create_monitor(
                user,
                snapshot(500),
                Money::new(300),
                None,
                "12 North Lane".to_string(),
            )
            .await
        else {
            panic!("create failed");
        };

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "monitor_created");
    }
}
