//! Append-only price-change audit log.
//!
//! One [`PriceChangeRecord`] is written per catalog price mutation,
//! before monitor matching is evaluated and regardless of whether any
//! monitor matches. The log is the reconciliation source for "what price
//! did the system see, and when".

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use super::{Money, ProductId};

/// A single recorded price mutation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PriceChangeRecord {
    /// Product whose price changed.
    pub product_id: ProductId,
    /// Product display name at change time.
    pub product_name: String,
    /// Price before the change.
    pub old_price: Money,
    /// Price after the change.
    pub new_price: Money,
    /// Who committed the change (admin name or id).
    pub changed_by: String,
    /// When the change was recorded.
    pub changed_at: DateTime<Utc>,
}

/// In-memory append-only store of price changes.
///
/// Entries are only ever appended; reads return the most recent entries
/// first, bounded by the caller's limit.
#[derive(Debug, Default)]
pub struct PriceChangeLog {
    entries: RwLock<Vec<PriceChangeRecord>>,
}

impl PriceChangeLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, returning a copy of what was recorded.
    pub async fn append(
        &self,
        product_id: ProductId,
        product_name: String,
        old_price: Money,
        new_price: Money,
        changed_by: String,
    ) -> PriceChangeRecord {
        let record = PriceChangeRecord {
            product_id,
            product_name,
            old_price,
            new_price,
            changed_by,
            changed_at: Utc::now(),
        };
        let mut entries = self.entries.write().await;
        entries.push(record.clone());
        record
    }

    /// Returns up to `limit` entries, newest first.
    pub async fn recent(&self, limit: usize) -> Vec<PriceChangeRecord> {
        let entries = self.entries.read().await;
        entries.iter().rev().take(limit).cloned().collect()
    }

    /// Returns the total number of recorded changes.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if nothing has been recorded yet.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
