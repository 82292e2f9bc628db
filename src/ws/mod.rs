//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams engine events to clients that
//! subscribe by user id and/or product id (wildcard `"*"` supported).

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
