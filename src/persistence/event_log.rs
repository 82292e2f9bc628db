//! Background task draining the event bus into the durable log.
//!
//! Persistence is write-behind: the in-memory stores are the source of
//! truth for serving requests, and this task records every published
//! event (plus a dedicated row per price change) for audit and
//! reconciliation. A database failure is logged and never propagates
//! back into the settlement path.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::postgres::PostgresPersistence;
use crate::domain::{EngineEvent, EventBus};

fn as_db_amount(money: crate::domain::Money) -> i64 {
    i64::try_from(money.get()).unwrap_or(i64::MAX)
}

/// Spawns the event-log writer task.
///
/// The task runs until the event bus is dropped. Individual write
/// failures are logged at `error` and skipped.
pub fn spawn_event_log(persistence: PostgresPersistence, event_bus: &EventBus) -> JoinHandle<()> {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    write_event(&persistence, &event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "event log writer lagged behind event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::info!("event log writer stopped");
    })
}

/// Spawns the daily retention task deleting event rows older than
/// `after_days`. A value of `0` disables cleanup and spawns nothing.
pub fn spawn_retention(
    persistence: PostgresPersistence,
    after_days: u64,
) -> Option<JoinHandle<()>> {
    if after_days == 0 {
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(24 * 60 * 60));
        loop {
            ticker.tick().await;
            match persistence.delete_old_events(after_days).await {
                Ok(deleted) if deleted > 0 => {
                    tracing::info!(deleted, "event log retention pass");
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "event log retention failed"),
            }
        }
    }))
}

async fn write_event(persistence: &PostgresPersistence, event: &EngineEvent) {
    let payload = match serde_json::to_value(event) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize event for the log");
            return;
        }
    };

    let user_id = event.user_id().map(|u| *u.as_uuid());
    let product_id = event.product_id().map(|p| p.as_str().to_string());
    if let Err(e) = persistence
        .save_event(
            event.event_type_str(),
            user_id,
            product_id.as_deref(),
            &payload,
        )
        .await
    {
        tracing::error!(
            error = %e,
            event_type = event.event_type_str(),
            "failed to persist event"
        );
    }

    if let EngineEvent::PriceChanged {
        product_id,
        product_name,
        old_price,
        new_price,
        changed_by,
        timestamp,
    } = event
        && let Err(e) = persistence
            .save_price_change(
                product_id.as_str(),
                product_name,
                as_db_amount(*old_price),
                as_db_amount(*new_price),
                changed_by,
                *timestamp,
            )
            .await
    {
        tracing::error!(error = %e, "failed to persist price change");
    }
}
