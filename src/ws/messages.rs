//! WebSocket message types: envelope and commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to engine events by user and/or product.
    Subscribe {
        /// User IDs to subscribe to. Use `["*"]` for all users.
        #[serde(default)]
        user_ids: Vec<String>,
        /// Product IDs to subscribe to. Use `["*"]` for all products.
        #[serde(default)]
        product_ids: Vec<String>,
    },
    /// Unsubscribe from previously subscribed users/products.
    Unsubscribe {
        /// User IDs to unsubscribe from.
        #[serde(default)]
        user_ids: Vec<String>,
        /// Product IDs to unsubscribe from.
        #[serde(default)]
        product_ids: Vec<String>,
    },
}
