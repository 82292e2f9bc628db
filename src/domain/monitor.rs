//! Auto-purchase monitor: a price watch with reserved funds.
//!
//! A [`Monitor`] is created when a user reserves `target_price` against a
//! product. It stays `Active` until a price event settles it
//! (`Purchased`), the user cancels it (`Cancelled`), or a ledger failure
//! during settlement strands it (`InsufficientFunds`). Monitors are never
//! deleted; closed ones remain as purchase history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Money, MonitorId, ProductId, UserId};

/// Lifecycle state of a monitor.
///
/// `Active` is the only non-terminal state; exactly one terminal
/// transition occurs per monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MonitorStatus {
    /// Watching for a matching price; funds are frozen.
    Active,
    /// Settled: funds spent, order emitted.
    Purchased,
    /// Cancelled by the owner: funds released.
    Cancelled,
    /// Ledger settlement failed after a match; flagged for manual
    /// reconciliation.
    InsufficientFunds,
}

impl MonitorStatus {
    /// Returns the status as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Purchased => "purchased",
            Self::Cancelled => "cancelled",
            Self::InsufficientFunds => "insufficient_funds",
        }
    }

    /// Returns `true` for any state other than `Active`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// Catalog data copied at monitor creation.
///
/// The engine never re-reads live catalog state: name, image, and the
/// price seen at creation are frozen into the monitor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductSnapshot {
    /// Catalog product key.
    pub product_id: ProductId,
    /// Product display name at creation time.
    pub product_name: String,
    /// Product image URL at creation time.
    pub product_image: String,
    /// Product price at creation time.
    pub price: Money,
}

/// A price-watch record with reservation accounting.
///
/// Invariant: while `status == Active`, the owner's wallet holds exactly
/// `target_price` in `frozen` for this monitor.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Monitor {
    /// Unique monitor identifier.
    pub id: MonitorId,
    /// Owning user.
    pub user_id: UserId,
    /// Watched product.
    pub product_id: ProductId,
    /// Display snapshot: product name.
    pub product_name: String,
    /// Display snapshot: product image URL.
    pub product_image: String,
    /// Price at or below which the purchase fires; equals the frozen
    /// reservation while active.
    pub target_price: Money,
    /// Safety ceiling persisted for display; not consulted by matching.
    pub max_price: Money,
    /// Last observed price (the purchase price once settled).
    pub current_price: Money,
    /// Price at creation time.
    pub original_price: Money,
    /// Lowest price observed for this monitor.
    pub lowest_price_seen: Money,
    /// Delivery address captured at creation.
    pub delivery_address: String,
    /// Lifecycle state.
    pub status: MonitorStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Settlement timestamp, once purchased.
    pub purchased_at: Option<DateTime<Utc>>,
}

impl Monitor {
    /// Creates an `Active` monitor from a product snapshot.
    ///
    /// The caller must already have reserved `target_price` in the ledger.
    #[must_use]
    pub fn new(
        user_id: UserId,
        snapshot: ProductSnapshot,
        target_price: Money,
        max_price: Money,
        delivery_address: String,
    ) -> Self {
        Self {
            id: MonitorId::new(),
            user_id,
            product_id: snapshot.product_id,
            product_name: snapshot.product_name,
            product_image: snapshot.product_image,
            target_price,
            max_price,
            current_price: snapshot.price,
            original_price: snapshot.price,
            lowest_price_seen: snapshot.price,
            delivery_address,
            status: MonitorStatus::Active,
            created_at: Utc::now(),
            purchased_at: None,
        }
    }

    /// Returns `true` while the monitor is in its only non-terminal state.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, MonitorStatus::Active)
    }

    /// Returns `true` if an active monitor's target covers `new_price`.
    #[must_use]
    pub fn matches(&self, new_price: Money) -> bool {
        self.is_active() && self.target_price >= new_price
    }

    /// Transitions `Active → Purchased`, recording the purchase price.
    pub fn mark_purchased(&mut self, purchase_price: Money) {
        self.status = MonitorStatus::Purchased;
        self.current_price = purchase_price;
        self.lowest_price_seen = self.lowest_price_seen.min(purchase_price);
        self.purchased_at = Some(Utc::now());
    }

    /// Transitions `Active → Cancelled`.
    pub fn mark_cancelled(&mut self) {
        self.status = MonitorStatus::Cancelled;
    }

    /// Transitions `Active → InsufficientFunds` after a failed ledger
    /// settle.
    pub fn mark_insufficient_funds(&mut self) {
        self.status = MonitorStatus::InsufficientFunds;
    }
}
