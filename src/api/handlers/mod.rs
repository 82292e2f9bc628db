//! REST endpoint handlers organized by resource.

pub mod monitor;
pub mod price;
pub mod system;
pub mod wallet;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(monitor::routes())
        .merge(price::routes())
        .merge(wallet::routes())
}
