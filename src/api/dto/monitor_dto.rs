//! Monitor-related DTOs for create, update, and list operations.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Money, Monitor, ProductId, UserId};

/// Request body for `POST /monitors`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMonitorRequest {
    /// Owner of the monitor and its reserved funds.
    pub user_id: UserId,
    /// Catalog identifier of the tracked product.
    pub product_id: ProductId,
    /// Product display name, captured at creation time.
    pub product_name: String,
    /// Product image URL, captured at creation time.
    #[serde(default)]
    pub product_image: String,
    /// Catalog price at creation time (minor units).
    pub current_price: Money,
    /// Price at or below which the purchase fires (minor units).
    pub target_price: Money,
    /// Optional informational ceiling shown to the user.
    #[serde(default)]
    pub max_price: Option<Money>,
    /// Shipping address for the eventual order.
    pub delivery_address: String,
}

/// Request body for `PATCH /monitors/{id}/target`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTargetRequest {
    /// Requesting user; must own the monitor.
    pub user_id: UserId,
    /// New target price (minor units, must be positive).
    pub target_price: Money,
}

/// Query parameters scoping a request to one user.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
pub struct UserQuery {
    /// User whose resources are requested.
    pub user_id: UserId,
}

/// List response for monitor endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct MonitorListResponse {
    /// Monitor records, newest first.
    pub data: Vec<Monitor>,
    /// Number of records returned.
    pub total: usize,
}

impl MonitorListResponse {
    /// Wraps a monitor list in the standard list envelope.
    #[must_use]
    pub fn new(data: Vec<Monitor>) -> Self {
        let total = data.len();
        Self { data, total }
    }
}
