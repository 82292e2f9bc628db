//! Wallet balance, deposit, and order handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{DepositRequest, OrderListResponse, UserQuery, WalletResponse};
use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::{EngineError, ErrorResponse};

/// `GET /wallets/:user_id` — Wallet balance view.
///
/// # Errors
///
/// Returns [`EngineError::WalletNotFound`] if the user has no wallet.
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{user_id}",
    tag = "Wallets",
    summary = "Get wallet balances",
    description = "Returns the user's spendable and reserved balances.",
    params(
        ("user_id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "Wallet balances", body = WalletResponse),
        (status = 404, description = "Wallet not found", body = ErrorResponse),
    )
)]
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(user_id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, EngineError> {
    let user_id = UserId::from_uuid(user_id);
    let wallet = state.autopay.wallet(user_id).await?;
    Ok(Json(WalletResponse::new(user_id, wallet)))
}

/// `POST /wallets/:user_id/deposit` — Credit the spendable balance.
///
/// # Errors
///
/// Returns [`EngineError::InvalidRequest`] for a zero amount.
#[utoipa::path(
    post,
    path = "/api/v1/wallets/{user_id}/deposit",
    tag = "Wallets",
    summary = "Deposit funds",
    description = "Credits the user's spendable balance, creating the wallet on first deposit.",
    params(
        ("user_id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    request_body = DepositRequest,
    responses(
        (status = 201, description = "Wallet after the deposit", body = WalletResponse),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
    )
)]
pub async fn deposit(
    State(state): State<AppState>,
    Path(user_id): Path<uuid::Uuid>,
    Json(req): Json<DepositRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let user_id = UserId::from_uuid(user_id);
    let wallet = state.autopay.deposit(user_id, req.amount).await?;
    Ok((
        StatusCode::CREATED,
        Json(WalletResponse::new(user_id, wallet)),
    ))
}

/// `GET /orders` — Settlement artifacts for one user.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    tag = "Wallets",
    summary = "List orders",
    description = "Returns the orders emitted by settled monitors, newest first.",
    params(UserQuery),
    responses(
        (status = 200, description = "Emitted orders", body = OrderListResponse),
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> impl IntoResponse {
    let data = state.autopay.list_orders(query.user_id).await;
    let total = data.len();
    Json(OrderListResponse { data, total })
}

/// Wallet and order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallets/{user_id}", get(get_wallet))
        .route("/wallets/{user_id}/deposit", post(deposit))
        .route("/orders", get(list_orders))
}
