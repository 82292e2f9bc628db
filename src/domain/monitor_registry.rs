//! Concurrent monitor storage with per-monitor fine-grained locking.
//!
//! [`MonitorRegistry`] stores all monitors in a `HashMap` where each
//! entry is individually protected by a [`tokio::sync::RwLock`]. The
//! per-monitor write lock is what makes the `Active → terminal`
//! transition exactly-once: settlement and cancellation both re-check the
//! status under that lock before mutating.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{Money, Monitor, MonitorId, ProductId, UserId};
use crate::error::EngineError;

/// Central store for all auto-purchase monitors, active and closed.
///
/// Closed monitors are retained as history and never removed.
///
/// # Concurrency
///
/// - Multiple tasks may read the same monitor concurrently.
/// - Writes to different monitors are concurrent.
/// - Writes to the same monitor are serialized.
#[derive(Debug)]
pub struct MonitorRegistry {
    monitors: RwLock<HashMap<MonitorId, Arc<RwLock<Monitor>>>>,
}

impl MonitorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            monitors: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a new monitor into the registry.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Internal`] if a monitor with the same id
    /// already exists (should never happen with UUID v4).
    pub async fn insert(&self, monitor: Monitor) -> Result<MonitorId, EngineError> {
        let id = monitor.id;
        let mut map = self.monitors.write().await;
        if map.contains_key(&id) {
            return Err(EngineError::Internal(format!("monitor {id} already exists")));
        }
        map.insert(id, Arc::new(RwLock::new(monitor)));
        Ok(id)
    }

    /// Returns a shared reference to the monitor behind its per-entry lock.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MonitorNotFound`] if no monitor with the
    /// given id exists.
    pub async fn get(&self, id: MonitorId) -> Result<Arc<RwLock<Monitor>>, EngineError> {
        let map = self.monitors.read().await;
        map.get(&id)
            .cloned()
            .ok_or(EngineError::MonitorNotFound(*id.as_uuid()))
    }

    /// Returns the user's `Active` monitors, newest first.
    pub async fn list_active(&self, user_id: UserId) -> Vec<Monitor> {
        let mut result = self
            .collect(|m| m.user_id == user_id && m.is_active())
            .await;
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }

    /// Returns the user's `Purchased` monitors, most recent purchase first.
    pub async fn list_purchased(&self, user_id: UserId) -> Vec<Monitor> {
        let mut result = self
            .collect(|m| {
                m.user_id == user_id && matches!(m.status, super::MonitorStatus::Purchased)
            })
            .await;
        result.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
        result
    }

    /// Returns the locks of all `Active` monitors for `product_id` whose
    /// target covers `new_price`, ordered ascending by
    /// `(created_at, id)` so settlement order is deterministic.
    ///
    /// The snapshot is advisory: settlement re-validates the status under
    /// each monitor's write lock.
    pub async fn find_matching(
        &self,
        product_id: &ProductId,
        new_price: Money,
    ) -> Vec<Arc<RwLock<Monitor>>> {
        let map = self.monitors.read().await;
        let mut matched = Vec::new();
        for entry in map.values() {
            let monitor = entry.read().await;
            if monitor.product_id == *product_id && monitor.matches(new_price) {
                matched.push((monitor.created_at, monitor.id, Arc::clone(entry)));
            }
        }
        drop(map);
        matched.sort_by(|a, b| (a.0, a.1.as_uuid()).cmp(&(b.0, b.1.as_uuid())));
        matched.into_iter().map(|(_, _, arc)| arc).collect()
    }

    /// Sum of `target_price` over the user's `Active` monitors.
    ///
    /// By the reservation invariant this always equals the user's frozen
    /// balance; exposed for reconciliation checks.
    pub async fn reserved_total(&self, user_id: UserId) -> Money {
        let map = self.monitors.read().await;
        let mut total = Money::ZERO;
        for entry in map.values() {
            let monitor = entry.read().await;
            if monitor.user_id == user_id && monitor.is_active() {
                total = total
                    .checked_add(monitor.target_price)
                    .unwrap_or(Money::new(u64::MAX));
            }
        }
        total
    }

    /// Returns the number of monitors in the registry (all states).
    pub async fn len(&self) -> usize {
        self.monitors.read().await.len()
    }

    /// Returns `true` if the registry contains no monitors.
    pub async fn is_empty(&self) -> bool {
        self.monitors.read().await.is_empty()
    }

    async fn collect<F>(&self, keep: F) -> Vec<Monitor>
    where
        F: Fn(&Monitor) -> bool,
    {
        let map = self.monitors.read().await;
        let mut result = Vec::new();
        for entry in map.values() {
            let monitor = entry.read().await;
            if keep(&monitor) {
                result.push(monitor.clone());
            }
        }
        result
    }
}

impl Default for MonitorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ProductSnapshot;

    fn make_monitor(user: UserId, product: &str, target: u64) -> Monitor {
        Monitor::new(
            user,
            ProductSnapshot {
                product_id: ProductId::new(product),
                product_name: "Linen Shirt".to_string(),
                product_image: "/images/linen-shirt.jpg".to_string(),
                price: Money::new(500),
            },
            Money::new(target),
            Money::new(target),
            "12 North Lane".to_string(),
        )
    }

    #[tokio::test]
    async fn insert_and_get() {
        let registry = MonitorRegistry::new();
        let monitor = make_monitor(UserId::new(), "prod-1", 300);
        let id = monitor.id;

        let result = registry.insert(monitor).await;
        assert_eq!(result.ok(), Some(id));
        assert!(registry.get(id).await.is_ok());
    }

    #[tokio::test]
    async fn get_nonexistent_returns_error() {
        let registry = MonitorRegistry::new();
        let result = registry.get(MonitorId::new()).await;
        let Err(EngineError::MonitorNotFound(_)) = result else {
            panic!("expected MonitorNotFound");
        };
    }

    #[tokio::test]
    async fn list_active_filters_by_user_and_status() {
        let registry = MonitorRegistry::new();
        let user = UserId::new();
        let other = UserId::new();

        let _ = registry.insert(make_monitor(user, "prod-1", 300)).await;
        let _ = registry.insert(make_monitor(other, "prod-1", 400)).await;

        let mut cancelled = make_monitor(user, "prod-2", 200);
        cancelled.mark_cancelled();
        let _ = registry.insert(cancelled).await;

        let active = registry.list_active(user).await;
        assert_eq!(active.len(), 1);
        assert_eq!(
            active.first().map(|m| m.target_price),
            Some(Money::new(300))
        );
    }

    #[tokio::test]
    async fn list_purchased_only_returns_purchased() {
        let registry = MonitorRegistry::new();
        let user = UserId::new();

        let mut bought = make_monitor(user, "prod-1", 300);
        bought.mark_purchased(Money::new(250));
        let _ = registry.insert(bought).await;
        let _ = registry.insert(make_monitor(user, "prod-2", 400)).await;

        let history = registry.list_purchased(user).await;
        assert_eq!(history.len(), 1);
        assert_eq!(
            history.first().map(|m| m.current_price),
            Some(Money::new(250))
        );
    }

    #[tokio::test]
    async fn find_matching_applies_target_threshold() {
        // Two monitors for the same product, targets 400 and 300; a drop
        // to 350 matches only the 400-target one.
        let registry = MonitorRegistry::new();
        let product = ProductId::new("prod-1");
        let _ = registry
            .insert(make_monitor(UserId::new(), "prod-1", 400))
            .await;
        let _ = registry
            .insert(make_monitor(UserId::new(), "prod-1", 300))
            .await;

        let matched = registry.find_matching(&product, Money::new(350)).await;
        assert_eq!(matched.len(), 1);
        let Some(entry) = matched.first() else {
            panic!("expected one match");
        };
        assert_eq!(entry.read().await.target_price, Money::new(400));
    }

    #[tokio::test]
    async fn find_matching_ignores_other_products() {
        let registry = MonitorRegistry::new();
        let _ = registry
            .insert(make_monitor(UserId::new(), "prod-2", 400))
            .await;

        let matched = registry
            .find_matching(&ProductId::new("prod-1"), Money::new(100))
            .await;
        assert!(matched.is_empty());
    }

    #[tokio::test]
    async fn find_matching_orders_by_creation() {
        let registry = MonitorRegistry::new();
        let product = ProductId::new("prod-1");

        let first = make_monitor(UserId::new(), "prod-1", 400);
        let first_id = first.id;
        let _ = registry.insert(first).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = make_monitor(UserId::new(), "prod-1", 400);
        let second_id = second.id;
        let _ = registry.insert(second).await;

        let matched = registry.find_matching(&product, Money::new(350)).await;
        let ids: Vec<MonitorId> = {
            let mut ids = Vec::new();
            for entry in &matched {
                ids.push(entry.read().await.id);
            }
            ids
        };
        assert_eq!(ids, vec![first_id, second_id]);
    }

    #[tokio::test]
    async fn reserved_total_sums_active_targets() {
        let registry = MonitorRegistry::new();
        let user = UserId::new();
        let _ = registry.insert(make_monitor(user, "prod-1", 300)).await;
        let _ = registry.insert(make_monitor(user, "prod-2", 450)).await;

        let mut closed = make_monitor(user, "prod-3", 999);
        closed.mark_cancelled();
        let _ = registry.insert(closed).await;

        assert_eq!(registry.reserved_total(user).await, Money::new(750));
    }
}
