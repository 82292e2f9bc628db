//! Per-connection subscription manager.
//!
//! Tracks which users and products a WebSocket client is subscribed to
//! and provides server-side event filtering.

use std::collections::HashSet;

use crate::domain::{EngineEvent, ProductId, UserId};

/// Manages the subscription filter for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed user IDs. Ignored while `subscribe_all` is set.
    user_ids: HashSet<UserId>,
    /// Subscribed product IDs. Ignored while `subscribe_all` is set.
    product_ids: HashSet<ProductId>,
    /// Whether the client subscribes to everything (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds users and products to the subscription set. `wildcard`
    /// enables the catch-all filter.
    pub fn subscribe(&mut self, users: &[UserId], products: &[ProductId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        for id in users {
            self.user_ids.insert(*id);
        }
        for id in products {
            self.product_ids.insert(id.clone());
        }
    }

    /// Removes users and products from the subscription set.
    pub fn unsubscribe(&mut self, users: &[UserId], products: &[ProductId]) {
        for id in users {
            self.user_ids.remove(id);
        }
        for id in products {
            self.product_ids.remove(id);
        }
    }

    /// Returns `true` if the event matches the subscription filter. An
    /// event matches when its user or its product is subscribed.
    #[must_use]
    pub fn matches(&self, event: &EngineEvent) -> bool {
        if self.subscribe_all {
            return true;
        }
        if let Some(user_id) = event.user_id()
            && self.user_ids.contains(&user_id)
        {
            return true;
        }
        if let Some(product_id) = event.product_id()
            && self.product_ids.contains(product_id)
        {
            return true;
        }
        false
    }

    /// Returns the number of explicitly subscribed users and products.
    #[must_use]
    pub fn count(&self) -> usize {
        self.user_ids.len() + self.product_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Money, MonitorId};
    use chrono::Utc;

    fn credited(user_id: UserId) -> EngineEvent {
        EngineEvent::WalletCredited {
            user_id,
            amount: Money::new(100),
            timestamp: Utc::now(),
        }
    }

    fn price_changed(product: &str) -> EngineEvent {
        EngineEvent::PriceChanged {
            product_id: ProductId::new(product),
            product_name: "Linen Shirt".to_string(),
            old_price: Money::new(500),
            new_price: Money::new(400),
            changed_by: "admin".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(&credited(UserId::new())));
        assert!(!mgr.matches(&price_changed("prod-1")));
    }

    #[test]
    fn subscribe_specific_user() {
        let mut mgr = SubscriptionManager::new();
        let user = UserId::new();
        mgr.subscribe(&[user], &[], false);
        assert!(mgr.matches(&credited(user)));
        assert!(!mgr.matches(&credited(UserId::new())));
    }

    #[test]
    fn subscribe_specific_product() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], &[ProductId::new("prod-1")], false);
        assert!(mgr.matches(&price_changed("prod-1")));
        assert!(!mgr.matches(&price_changed("prod-2")));
    }

    #[test]
    fn user_filter_catches_settlement_events() {
        let mut mgr = SubscriptionManager::new();
        let user = UserId::new();
        mgr.subscribe(&[user], &[], false);
        let event = EngineEvent::MonitorPurchased {
            monitor_id: MonitorId::new(),
            user_id: user,
            product_id: ProductId::new("prod-1"),
            order_id: uuid::Uuid::new_v4(),
            cost: Money::new(250),
            refund: Money::new(50),
            timestamp: Utc::now(),
        };
        assert!(mgr.matches(&event));
    }

    #[test]
    fn wildcard_matches_everything() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], &[], true);
        assert!(mgr.matches(&credited(UserId::new())));
        assert!(mgr.matches(&price_changed("prod-1")));
    }

    #[test]
    fn unsubscribe_removes_filter() {
        let mut mgr = SubscriptionManager::new();
        let user = UserId::new();
        mgr.subscribe(&[user], &[ProductId::new("prod-1")], false);
        assert_eq!(mgr.count(), 2);
        mgr.unsubscribe(&[user], &[ProductId::new("prod-1")]);
        assert_eq!(mgr.count(), 0);
        assert!(!mgr.matches(&credited(user)));
    }
}
