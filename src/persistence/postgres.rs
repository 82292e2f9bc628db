//! PostgreSQL implementation of the persistence layer.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{StoredEvent, StoredPriceChange};
use crate::error::EngineError;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends an event to the durable event log.
    ///
    /// # Errors
    ///
    /// Returns a [`EngineError::PersistenceError`] on database failure.
    pub async fn save_event(
        &self,
        event_type: &str,
        user_id: Option<Uuid>,
        product_id: Option<&str>,
        payload: &serde_json::Value,
    ) -> Result<i64, EngineError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (event_type, user_id, product_id, payload) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(event_type)
        .bind(user_id)
        .bind(product_id)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| EngineError::PersistenceError(e.to_string()))?;

        Ok(row)
    }

    /// Appends a price-change row to the durable audit trail.
    ///
    /// # Errors
    ///
    /// Returns a [`EngineError::PersistenceError`] on database failure.
    pub async fn save_price_change(
        &self,
        product_id: &str,
        product_name: &str,
        old_price: i64,
        new_price: i64,
        changed_by: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<i64, EngineError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO price_changes (product_id, product_name, old_price, new_price, changed_by, changed_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(product_id)
        .bind(product_name)
        .bind(old_price)
        .bind(new_price)
        .bind(changed_by)
        .bind(changed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| EngineError::PersistenceError(e.to_string()))?;

        Ok(row)
    }

    /// Loads events after the given timestamp, optionally filtered by user.
    ///
    /// # Errors
    ///
    /// Returns a [`EngineError::PersistenceError`] on database failure.
    pub async fn load_events_after(
        &self,
        after: DateTime<Utc>,
        user_id: Option<Uuid>,
    ) -> Result<Vec<StoredEvent>, EngineError> {
        let rows = if let Some(uid) = user_id {
            sqlx::query_as::<_, (i64, String, Option<Uuid>, Option<String>, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, event_type, user_id, product_id, payload, created_at FROM events \
                 WHERE created_at > $1 AND user_id = $2 ORDER BY created_at ASC",
            )
            .bind(after)
            .bind(uid)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, (i64, String, Option<Uuid>, Option<String>, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, event_type, user_id, product_id, payload, created_at FROM events \
                 WHERE created_at > $1 ORDER BY created_at ASC",
            )
            .bind(after)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| EngineError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, event_type, user_id, product_id, payload, created_at)| StoredEvent {
                    id,
                    event_type,
                    user_id,
                    product_id,
                    payload,
                    created_at,
                },
            )
            .collect())
    }

    /// Loads the most recent price changes, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`EngineError::PersistenceError`] on database failure.
    pub async fn load_recent_price_changes(
        &self,
        limit: i64,
    ) -> Result<Vec<StoredPriceChange>, EngineError> {
        let rows = sqlx::query_as::<_, (i64, String, String, i64, i64, String, DateTime<Utc>)>(
            "SELECT id, product_id, product_name, old_price, new_price, changed_by, changed_at \
             FROM price_changes ORDER BY changed_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EngineError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, product_id, product_name, old_price, new_price, changed_by, changed_at)| {
                    StoredPriceChange {
                        id,
                        product_id,
                        product_name,
                        old_price,
                        new_price,
                        changed_by,
                        changed_at,
                    }
                },
            )
            .collect())
    }

    /// Deletes event rows older than the given number of days.
    ///
    /// # Errors
    ///
    /// Returns a [`EngineError::PersistenceError`] on database failure.
    pub async fn delete_old_events(&self, before_days: u64) -> Result<u64, EngineError> {
        let cutoff =
            Utc::now() - chrono::Duration::days(i64::try_from(before_days).unwrap_or(i64::MAX));

        let result = sqlx::query("DELETE FROM events WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::PersistenceError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
