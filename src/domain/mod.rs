//! Domain layer: money, wallets, monitors, and the event system.
//!
//! This module contains the engine's core model: the ledger with
//! per-wallet locking, the monitor registry with per-monitor locking,
//! the append-only price-change log, emitted orders, and the broadcast
//! event bus that reflects every state mutation.

pub mod event;
pub mod event_bus;
pub mod ids;
pub mod ledger;
pub mod money;
pub mod monitor;
pub mod monitor_registry;
pub mod order;
pub mod price_log;
pub mod wallet;

pub use event::{EngineEvent, SkipReason};
pub use event_bus::EventBus;
pub use ids::{MonitorId, ProductId, UserId};
pub use ledger::Ledger;
pub use money::Money;
pub use monitor::{Monitor, MonitorStatus, ProductSnapshot};
pub use monitor_registry::MonitorRegistry;
pub use order::{Order, OrderLine, OrderStore};
pub use price_log::{PriceChangeLog, PriceChangeRecord};
pub use wallet::Wallet;
