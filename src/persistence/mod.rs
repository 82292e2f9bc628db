//! Persistence layer: PostgreSQL event log and price-change audit trail.
//!
//! The in-memory stores stay authoritative; a background writer drains
//! the event bus into PostgreSQL via `sqlx::PgPool` for durable audit
//! and reconciliation.

pub mod event_log;
pub mod models;
pub mod postgres;

pub use event_log::{spawn_event_log, spawn_retention};
pub use postgres::PostgresPersistence;
