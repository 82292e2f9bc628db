//! Monitor lifecycle handlers: create, list, history, cancel, retarget.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreateMonitorRequest, MonitorListResponse, UpdateTargetRequest, UserQuery,
};
use crate::app_state::AppState;
use crate::domain::{MonitorId, ProductSnapshot};
use crate::error::{EngineError, ErrorResponse};

/// `POST /monitors` — Create a monitor, reserving the target amount.
///
/// # Errors
///
/// Returns [`EngineError::InsufficientFunds`] when the spendable balance
/// does not cover the target, [`EngineError::WalletNotFound`] when the
/// user has no wallet.
#[utoipa::path(
    post,
    path = "/api/v1/monitors",
    tag = "Monitors",
    summary = "Create a price monitor",
    description = "Reserves the target amount from the user's spendable balance and starts tracking the product. The reservation and the monitor are created as one unit.",
    request_body = CreateMonitorRequest,
    responses(
        (status = 201, description = "Monitor created, funds reserved", body = crate::domain::Monitor),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Wallet not found", body = ErrorResponse),
        (status = 422, description = "Insufficient funds", body = ErrorResponse),
    )
)]
pub async fn create_monitor(
    State(state): State<AppState>,
    Json(req): Json<CreateMonitorRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let snapshot = ProductSnapshot {
        product_id: req.product_id,
        product_name: req.product_name,
        product_image: req.product_image,
        price: req.current_price,
    };
    let monitor = state
        .autopay
        .create_monitor(
            req.user_id,
            snapshot,
            req.target_price,
            req.max_price,
            req.delivery_address,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(monitor)))
}

/// `GET /monitors` — List the user's active monitors.
#[utoipa::path(
    get,
    path = "/api/v1/monitors",
    tag = "Monitors",
    summary = "List active monitors",
    description = "Returns the user's active monitors, newest first.",
    params(UserQuery),
    responses(
        (status = 200, description = "Active monitors", body = MonitorListResponse),
    )
)]
pub async fn list_monitors(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> impl IntoResponse {
    let monitors = state.autopay.list_active(query.user_id).await;
    Json(MonitorListResponse::new(monitors))
}

/// `GET /monitors/history` — List the user's purchased monitors.
#[utoipa::path(
    get,
    path = "/api/v1/monitors/history",
    tag = "Monitors",
    summary = "List purchased monitors",
    description = "Returns the user's settled monitors, most recent purchase first.",
    params(UserQuery),
    responses(
        (status = 200, description = "Purchased monitors", body = MonitorListResponse),
    )
)]
pub async fn monitor_history(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> impl IntoResponse {
    let monitors = state.autopay.list_purchased(query.user_id).await;
    Json(MonitorListResponse::new(monitors))
}

/// `DELETE /monitors/:id` — Cancel a monitor and release its reservation.
///
/// # Errors
///
/// Returns [`EngineError::MonitorNotFound`] for an unknown id and
/// [`EngineError::Forbidden`] when the requester does not own the monitor.
#[utoipa::path(
    delete,
    path = "/api/v1/monitors/{id}",
    tag = "Monitors",
    summary = "Cancel a monitor",
    description = "Cancels an active monitor and returns its reserved amount to the spendable balance. Cancelling an already-closed monitor is a no-op.",
    params(
        ("id" = uuid::Uuid, Path, description = "Monitor UUID"),
        UserQuery,
    ),
    responses(
        (status = 200, description = "Monitor after cancellation", body = crate::domain::Monitor),
        (status = 403, description = "Not the monitor owner", body = ErrorResponse),
        (status = 404, description = "Monitor not found", body = ErrorResponse),
    )
)]
pub async fn cancel_monitor(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, EngineError> {
    let monitor = state
        .autopay
        .cancel_monitor(MonitorId::from_uuid(id), query.user_id)
        .await?;
    Ok(Json(monitor))
}

/// `PATCH /monitors/:id/target` — Change an active monitor's target price.
///
/// # Errors
///
/// Returns [`EngineError::InsufficientFunds`] when raising the target
/// beyond the spendable balance, [`EngineError::Forbidden`] for a
/// non-owner, [`EngineError::InvalidRequest`] for a closed monitor.
#[utoipa::path(
    patch,
    path = "/api/v1/monitors/{id}/target",
    tag = "Monitors",
    summary = "Update target price",
    description = "Adjusts the target price of an active monitor, reserving or releasing the difference so the frozen balance always equals the sum of active targets.",
    params(
        ("id" = uuid::Uuid, Path, description = "Monitor UUID"),
    ),
    request_body = UpdateTargetRequest,
    responses(
        (status = 200, description = "Monitor with updated target", body = crate::domain::Monitor),
        (status = 400, description = "Monitor is not active", body = ErrorResponse),
        (status = 403, description = "Not the monitor owner", body = ErrorResponse),
        (status = 404, description = "Monitor not found", body = ErrorResponse),
        (status = 422, description = "Insufficient funds for the increase", body = ErrorResponse),
    )
)]
pub async fn update_target(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateTargetRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let monitor = state
        .autopay
        .update_target(MonitorId::from_uuid(id), req.user_id, req.target_price)
        .await?;
    Ok(Json(monitor))
}

/// Monitor lifecycle routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/monitors", post(create_monitor).get(list_monitors))
        .route("/monitors/history", get(monitor_history))
        .route(
            "/monitors/{id}",
            axum::routing::delete(cancel_monitor),
        )
        .route("/monitors/{id}/target", patch(update_target))
}
