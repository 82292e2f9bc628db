//! Database models for the durable event log and price-change audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored event row from the `events` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Auto-increment row ID.
    pub id: i64,
    /// Event type discriminator (e.g. `"monitor_purchased"`).
    pub event_type: String,
    /// User the event concerns, when any.
    pub user_id: Option<Uuid>,
    /// Product the event concerns, when any.
    pub product_id: Option<String>,
    /// JSONB payload with event-specific data.
    pub payload: serde_json::Value,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A stored row from the `price_changes` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPriceChange {
    /// Auto-increment row ID.
    pub id: i64,
    /// Product whose price changed.
    pub product_id: String,
    /// Product display name at the time of the change.
    pub product_name: String,
    /// Price before the change (minor units).
    pub old_price: i64,
    /// Price after the change (minor units).
    pub new_price: i64,
    /// Actor who made the change.
    pub changed_by: String,
    /// Change timestamp.
    pub changed_at: DateTime<Utc>,
}
