//! # autopay-engine
//!
//! Wallet ledger and price-triggered auto-purchase engine.
//!
//! A user reserves funds against a target price for a product; the
//! moment the catalog reports a price at or below that target, the
//! engine settles the reservation, emits a fulfillment order, and
//! closes the monitor. Funds are never double-spent and never lost:
//! the frozen balance of a wallet always equals the sum of its active
//! monitors' targets.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)          Catalog service
//!     │                                   │
//!     ├── REST Handlers (api/)  ◄─────────┘ POST /price-changes
//!     ├── WS Handler (ws/)
//!     │
//!     ├── AutopayService / SettlementEngine (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── Ledger · MonitorRegistry · OrderStore · PriceChangeLog (domain/)
//!     │
//!     └── PostgreSQL event log (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
