//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::{AutopayService, SettlementEngine};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// User-facing wallet and monitor operations.
    pub autopay: Arc<AutopayService>,
    /// Price-change handler and settlement executor.
    pub settlement: Arc<SettlementEngine>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}
