//! Price-change DTOs for the catalog hook and the audit log endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Money, PriceChangeRecord, ProductId};
use crate::service::PriceChangeOutcome;

/// Request body for `POST /price-changes`, sent by the catalog service
/// after it commits a price edit.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PriceChangeRequest {
    /// Product whose price changed.
    pub product_id: ProductId,
    /// Product display name at the time of the change.
    pub product_name: String,
    /// Price before the change (minor units).
    pub old_price: Money,
    /// Price after the change (minor units).
    pub new_price: Money,
    /// Actor who made the change.
    #[serde(default = "default_changed_by")]
    pub changed_by: String,
}

fn default_changed_by() -> String {
    "catalog".to_string()
}

/// Response body for `POST /price-changes`: the audit entry plus
/// settlement counts for the synchronous pass.
#[derive(Debug, Serialize, ToSchema)]
pub struct PriceChangeResponse {
    /// The audit entry written for this change.
    pub log: PriceChangeRecord,
    /// Monitors that matched when the event arrived.
    pub matched: usize,
    /// Monitors settled into purchases.
    pub purchased: usize,
    /// Monitors skipped.
    pub skipped: usize,
    /// Monitors whose settlement failed.
    pub failed: usize,
}

impl From<PriceChangeOutcome> for PriceChangeResponse {
    fn from(outcome: PriceChangeOutcome) -> Self {
        Self {
            log: outcome.log,
            matched: outcome.matched,
            purchased: outcome.purchased,
            skipped: outcome.skipped,
            failed: outcome.failed,
        }
    }
}

/// Query parameters for `GET /price-changes`.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
pub struct PriceLogQuery {
    /// Maximum number of entries to return (capped at 50).
    #[serde(default)]
    pub limit: Option<usize>,
}

/// List response for `GET /price-changes`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PriceLogResponse {
    /// Audit entries, newest first.
    pub data: Vec<PriceChangeRecord>,
    /// Number of entries returned.
    pub total: usize,
}
