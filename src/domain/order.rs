//! Fulfillment orders emitted by settlement.
//!
//! The settlement executor only emits an [`Order`]; ownership passes to
//! the order-fulfillment collaborator once created. [`OrderStore`] is the
//! hand-off buffer the collaborator reads from.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use super::{Money, ProductId, UserId};

/// A single order line item. Auto-purchase orders always carry exactly
/// one line with quantity 1.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderLine {
    /// Purchased product.
    pub product_id: ProductId,
    /// Product display name from the monitor snapshot.
    pub product_name: String,
    /// Product image URL from the monitor snapshot.
    pub product_image: String,
    /// Number of units.
    pub quantity: u32,
    /// Purchase price per unit (the new price that triggered settlement).
    pub price: Money,
}

/// A settlement artifact: one completed wallet payment awaiting fulfillment.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Order {
    /// Unique order identifier.
    pub id: uuid::Uuid,
    /// Purchasing user.
    pub user_id: UserId,
    /// Line items (exactly one for auto-purchase orders).
    pub items: Vec<OrderLine>,
    /// Total charged to the wallet.
    pub total_amount: Money,
    /// Delivery address from the monitor.
    pub shipping_address: String,
    /// Always `"wallet"` for engine-created orders.
    pub payment_method: String,
    /// Fulfillment status, owned by the order subsystem after emission.
    pub order_status: String,
    /// Always `"autopurchase"` for engine-created orders.
    pub order_source: String,
    /// Always `"completed"`: the ledger settle happened before emission.
    pub payment_status: String,
    /// Emission timestamp.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Builds an auto-purchase order for a single unit at `price`.
    #[must_use]
    pub fn auto_purchase(
        user_id: UserId,
        product_id: ProductId,
        product_name: String,
        product_image: String,
        price: Money,
        shipping_address: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            user_id,
            items: vec![OrderLine {
                product_id,
                product_name,
                product_image,
                quantity: 1,
                price,
            }],
            total_amount: price,
            shipping_address,
            payment_method: "wallet".to_string(),
            order_status: "pending".to_string(),
            order_source: "autopurchase".to_string(),
            payment_status: "completed".to_string(),
            created_at: Utc::now(),
        }
    }
}

/// In-memory buffer of emitted orders.
#[derive(Debug, Default)]
pub struct OrderStore {
    orders: RwLock<Vec<Order>>,
}

impl OrderStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an emitted order.
    pub async fn append(&self, order: Order) {
        let mut orders = self.orders.write().await;
        orders.push(order);
    }

    /// Returns the user's orders, newest first.
    pub async fn list_for_user(&self, user_id: UserId) -> Vec<Order> {
        let orders = self.orders.read().await;
        let mut result: Vec<Order> = orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }

    /// Returns the total number of emitted orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Returns `true` if no orders have been emitted.
    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_order(user: UserId, price: u64) -> Order {
        Order::auto_purchase(
            user,
            ProductId::new("prod-1"),
            "Linen Shirt".to_string(),
            "/images/linen-shirt.jpg".to_string(),
            Money::new(price),
            "12 North Lane".to_string(),
        )
    }

    #[test]
    fn auto_purchase_order_shape() {
        let order = make_order(UserId::new(), 250);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items.first().map(|l| l.quantity), Some(1));
        assert_eq!(order.total_amount, Money::new(250));
        assert_eq!(order.payment_method, "wallet");
        assert_eq!(order.order_source, "autopurchase");
        assert_eq!(order.payment_status, "completed");
    }

    #[tokio::test]
    async fn list_for_user_filters_and_sorts() {
        let store = OrderStore::new();
        let user = UserId::new();
        store.append(make_order(user, 250)).await;
        store.append(make_order(UserId::new(), 999)).await;
        store.append(make_order(user, 100)).await;

        let orders = store.list_for_user(user).await;
        assert_eq!(orders.len(), 2);
        // Newest first.
        assert_eq!(
            orders.first().map(|o| o.total_amount),
            Some(Money::new(100))
        );
    }

    #[tokio::test]
    async fn empty_store_reports_empty() {
        let store = OrderStore::new();
        assert!(store.is_empty().await);
        assert!(store.list_for_user(UserId::new()).await.is_empty());
    }
}
