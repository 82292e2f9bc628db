//! Domain events reflecting engine state mutations.
//!
//! Every state change emits an [`EngineEvent`] through the
//! [`super::EventBus`]. Events feed WebSocket subscribers and, when
//! persistence is enabled, the durable audit log used for reconciliation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Money, MonitorId, ProductId, UserId};

/// Why a matched monitor was skipped instead of settled.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The wallet owner no longer exists; the monitor stays `Active`
    /// pending manual follow-up.
    UserMissing,
    /// Another event settled or cancelled the monitor first.
    AlreadyClosed,
    /// A concurrent target-price decrease moved the target below the new
    /// price between matching and settlement.
    NoLongerMatching,
}

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Emitted when a monitor is created and its funds reserved.
    MonitorCreated {
        /// Monitor identifier.
        monitor_id: MonitorId,
        /// Owning user.
        user_id: UserId,
        /// Watched product.
        product_id: ProductId,
        /// Reserved target price.
        target_price: Money,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a monitor is cancelled and its reservation released.
    MonitorCancelled {
        /// Monitor identifier.
        monitor_id: MonitorId,
        /// Owning user.
        user_id: UserId,
        /// Amount released back to the spendable balance.
        released: Money,
        /// Cancellation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a monitor's target price (and reservation) changes.
    TargetUpdated {
        /// Monitor identifier.
        monitor_id: MonitorId,
        /// Owning user.
        user_id: UserId,
        /// Target before the edit.
        old_target: Money,
        /// Target after the edit.
        new_target: Money,
        /// Edit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a wallet receives a deposit.
    WalletCredited {
        /// Credited user.
        user_id: UserId,
        /// Deposit amount.
        amount: Money,
        /// Deposit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted for every catalog price mutation, before matching runs.
    PriceChanged {
        /// Product whose price changed.
        product_id: ProductId,
        /// Product display name.
        product_name: String,
        /// Price before the change.
        old_price: Money,
        /// Price after the change.
        new_price: Money,
        /// Who committed the change.
        changed_by: String,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a monitor settles into a purchase.
    MonitorPurchased {
        /// Monitor identifier.
        monitor_id: MonitorId,
        /// Purchasing user.
        user_id: UserId,
        /// Purchased product.
        product_id: ProductId,
        /// Emitted fulfillment order.
        order_id: uuid::Uuid,
        /// Amount charged (the new price).
        cost: Money,
        /// Reservation surplus returned to the spendable balance.
        refund: Money,
        /// Settlement timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a matched monitor is skipped without settling.
    SettlementSkipped {
        /// Monitor identifier.
        monitor_id: MonitorId,
        /// Owning user.
        user_id: UserId,
        /// Watched product.
        product_id: ProductId,
        /// Why the monitor was skipped.
        reason: SkipReason,
        /// Skip timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when the ledger settle fails after a match; the monitor is
    /// flagged `insufficient_funds` for manual reconciliation.
    SettlementFailed {
        /// Monitor identifier.
        monitor_id: MonitorId,
        /// Owning user.
        user_id: UserId,
        /// Watched product.
        product_id: ProductId,
        /// Failure detail for the operational log.
        detail: String,
        /// Failure timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl EngineEvent {
    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::MonitorCreated { .. } => "monitor_created",
            Self::MonitorCancelled { .. } => "monitor_cancelled",
            Self::TargetUpdated { .. } => "target_updated",
            Self::WalletCredited { .. } => "wallet_credited",
            Self::PriceChanged { .. } => "price_changed",
            Self::MonitorPurchased { .. } => "monitor_purchased",
            Self::SettlementSkipped { .. } => "settlement_skipped",
            Self::SettlementFailed { .. } => "settlement_failed",
        }
    }

    /// Returns the user the event concerns, if any. Price changes are
    /// product-scoped and carry no user.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::MonitorCreated { user_id, .. }
            | Self::MonitorCancelled { user_id, .. }
            | Self::TargetUpdated { user_id, .. }
            | Self::WalletCredited { user_id, .. }
            | Self::MonitorPurchased { user_id, .. }
            | Self::SettlementSkipped { user_id, .. }
            | Self::SettlementFailed { user_id, .. } => Some(*user_id),
            Self::PriceChanged { .. } => None,
        }
    }

    /// Returns the product the event concerns, if any.
    #[must_use]
    pub const fn product_id(&self) -> Option<&ProductId> {
        match self {
            Self::MonitorCreated { product_id, .. }
            | Self::PriceChanged { product_id, .. }
            | Self::MonitorPurchased { product_id, .. }
            | Self::SettlementSkipped { product_id, .. }
            | Self::SettlementFailed { product_id, .. } => Some(product_id),
            Self::MonitorCancelled { .. }
            | Self::TargetUpdated { .. }
            | Self::WalletCredited { .. } => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn event_type_strings() {
        let event = EngineEvent::MonitorCreated {
            monitor_id: MonitorId::new(),
            user_id: UserId::new(),
            product_id: ProductId::new("prod-1"),
            target_price: Money::new(300),
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_type_str(), "monitor_created");
    }

    #[test]
    fn purchased_event_serializes_with_tag() {
        let event = EngineEvent::MonitorPurchased {
            monitor_id: MonitorId::new(),
            user_id: UserId::new(),
            product_id: ProductId::new("prod-1"),
            order_id: uuid::Uuid::new_v4(),
            cost: Money::new(250),
            refund: Money::new(50),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert!(json.contains("\"event_type\":\"monitor_purchased\""));
        assert!(json.contains("250"));
    }

    #[test]
    fn price_changed_has_no_user() {
        let event = EngineEvent::PriceChanged {
            product_id: ProductId::new("prod-1"),
            product_name: "Linen Shirt".to_string(),
            old_price: Money::new(500),
            new_price: Money::new(250),
            changed_by: "admin".to_string(),
            timestamp: Utc::now(),
        };
        assert!(event.user_id().is_none());
        assert_eq!(
            event.product_id().map(ProductId::as_str),
            Some("prod-1")
        );
    }

    #[test]
    fn skip_reason_serializes_snake_case() {
        let json = serde_json::to_string(&SkipReason::UserMissing).ok();
        assert_eq!(json.as_deref(), Some("\"user_missing\""));
    }
}
