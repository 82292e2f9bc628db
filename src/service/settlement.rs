//! Price-change handling and settlement execution.
//!
//! [`SettlementEngine::handle_price_change`] is the entry point the
//! catalog collaborator calls after committing a price edit. It writes
//! the audit log entry first, then settles every matching monitor
//! sequentially. Settlement is synchronous: the call returns only after
//! every match has been settled or skipped, so outcomes are
//! deterministic and per-product ordering is preserved.
//!
//! Exactly-once settlement: the `Active → Purchased` transition is a
//! compare-and-set under the monitor's write lock. A monitor observed as
//! already closed is skipped, never re-settled, so two overlapping price
//! events produce exactly one purchase and one order.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{
    EngineEvent, EventBus, Ledger, Money, Monitor, MonitorRegistry, Order, OrderStore,
    PriceChangeLog, PriceChangeRecord, ProductId, SkipReason,
};
use crate::error::EngineError;

/// Outcome of settling one matched monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Funds settled, order emitted, monitor closed.
    Purchased {
        /// Emitted order id.
        order_id: uuid::Uuid,
        /// Amount charged.
        cost: Money,
        /// Reservation surplus returned to the spendable balance.
        refund: Money,
    },
    /// The monitor no longer matched under its write lock (closed by a
    /// concurrent event, or its target dropped below the new price).
    Skipped(SkipReason),
    /// The ledger settle failed; the monitor is flagged
    /// `insufficient_funds` for manual reconciliation.
    Failed,
}

/// Summary of one handled price change, returned to the caller.
#[derive(Debug, Clone)]
pub struct PriceChangeOutcome {
    /// The audit entry written for this change.
    pub log: PriceChangeRecord,
    /// Number of monitors that matched when the event arrived.
    pub matched: usize,
    /// Monitors settled into purchases.
    pub purchased: usize,
    /// Monitors skipped (already closed, no longer matching, or owner
    /// missing).
    pub skipped: usize,
    /// Monitors whose ledger settle failed.
    pub failed: usize,
}

/// Drives settlement whenever a tracked product's price changes.
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    ledger: Arc<Ledger>,
    registry: Arc<MonitorRegistry>,
    orders: Arc<OrderStore>,
    price_log: Arc<PriceChangeLog>,
    event_bus: EventBus,
}

impl SettlementEngine {
    /// Creates a new `SettlementEngine` over shared domain stores.
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

    /// Handles a committed catalog price change.
    ///
    /// Appends the audit entry unconditionally (before matching), then
    /// settles each matching monitor in creation order. One monitor's
    /// failure never blocks the log entry or the remaining monitors.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRequest`] if `new_price == old_price`;
    /// the catalog contract only fires this hook on an actual change.
    pub async fn handle_price_change(
        &self,
        product_id: ProductId,
        product_name: String,
        old_price: Money,
        new_price: Money,
        changed_by: String,
    ) -> Result<PriceChangeOutcome, EngineError> {
        if new_price == old_price {
            return Err(EngineError::InvalidRequest(
                "price did not change".to_string(),
            ));
        }

        let log = self
            .price_log
            .append(
                product_id.clone(),
                product_name.clone(),
                old_price,
                new_price,
                changed_by.clone(),
            )
            .await;

        let _ = self.event_bus.publish(EngineEvent::PriceChanged {
            product_id: product_id.clone(),
            product_name: product_name.clone(),
            old_price,
            new_price,
            changed_by,
            timestamp: Utc::now(),
        });

        let matches = self.registry.find_matching(&product_id, new_price).await;
        tracing::info!(
            %product_id,
            %old_price,
            %new_price,
            matched = matches.len(),
            "price change recorded"
        );

        let mut outcome = PriceChangeOutcome {
            log,
            matched: matches.len(),
            purchased: 0,
            skipped: 0,
            failed: 0,
        };

        // Sequential on purpose: per-product settlement order must stay
        // deterministic.
        for entry in &matches {
            match self.settle(entry, new_price).await {
                SettlementOutcome::Purchased { .. } => outcome.purchased += 1,
                SettlementOutcome::Skipped(_) => outcome.skipped += 1,
                SettlementOutcome::Failed => outcome.failed += 1,
            }
        }

        Ok(outcome)
    }

    /// Settles one matched monitor at `new_price`.
    ///
    /// The ledger settle, order emission, and monitor transition all
    /// happen under the monitor's write lock, so any observer sees the
    /// three effects as one unit.
    pub async fn settle(
        &self,
        entry: &Arc<RwLock<Monitor>>,
        new_price: Money,
    ) -> SettlementOutcome {
        let mut monitor = entry.write().await;

        // Exactly-once guard: re-validate under the write lock.
        if !monitor.is_active() {
            tracing::debug!(
                monitor_id = %monitor.id,
                status = monitor.status.as_str(),
                "skipping settlement of closed monitor"
            );
            return self.skip(&monitor, SkipReason::AlreadyClosed);
        }
        if monitor.target_price < new_price {
            return self.skip(&monitor, SkipReason::NoLongerMatching);
        }

        let reserved = monitor.target_price;
        match self
            .ledger
            .settle_from_frozen(monitor.user_id, reserved, new_price)
            .await
        {
            Ok(refund) => {
                let order = Order::auto_purchase(
                    monitor.user_id,
                    monitor.product_id.clone(),
                    monitor.product_name.clone(),
                    monitor.product_image.clone(),
                    new_price,
                    monitor.delivery_address.clone(),
                );
                let order_id = order.id;
                self.orders.append(order).await;
                monitor.mark_purchased(new_price);

                let _ = self.event_bus.publish(EngineEvent::MonitorPurchased {
                    monitor_id: monitor.id,
                    user_id: monitor.user_id,
                    product_id: monitor.product_id.clone(),
                    order_id,
                    cost: new_price,
                    refund,
                    timestamp: Utc::now(),
                });

                tracing::info!(
                    monitor_id = %monitor.id,
                    user_id = %monitor.user_id,
                    %order_id,
                    cost = %new_price,
                    %refund,
                    "auto-purchase settled"
                );
                SettlementOutcome::Purchased {
                    order_id,
                    cost: new_price,
                    refund,
                }
            }
            Err(EngineError::WalletNotFound(_)) => {
                // Deleted account: recoverable skip, monitor stays active
                // until a cleanup policy decides otherwise.
                tracing::warn!(
                    monitor_id = %monitor.id,
                    user_id = %monitor.user_id,
                    "settlement skipped: wallet owner missing"
                );
                self.skip(&monitor, SkipReason::UserMissing)
            }
            Err(e) => {
                // Operational alert: the ledger state contradicts the
                // reservation bookkeeping. Never advance to purchased.
                tracing::error!(
                    monitor_id = %monitor.id,
                    user_id = %monitor.user_id,
                    error = %e,
                    "settlement failed, monitor flagged for reconciliation"
                );
                monitor.mark_insufficient_funds();
                let _ = self.event_bus.publish(EngineEvent::SettlementFailed {
                    monitor_id: monitor.id,
                    user_id: monitor.user_id,
                    product_id: monitor.product_id.clone(),
                    detail: e.to_string(),
                    timestamp: Utc::now(),
                });
                SettlementOutcome::Failed
            }
        }
    }

    fn skip(&self, monitor: &Monitor, reason: SkipReason) -> SettlementOutcome {
        let _ = self.event_bus.publish(EngineEvent::SettlementSkipped {
            monitor_id: monitor.id,
            user_id: monitor.user_id,
            product_id: monitor.product_id.clone(),
            reason,
            timestamp: Utc::now(),
        });
        SettlementOutcome::Skipped(reason)
    }
}
