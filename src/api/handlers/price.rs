//! Price-change hook and audit log handlers.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{PriceChangeRequest, PriceChangeResponse, PriceLogQuery, PriceLogResponse};
use crate::app_state::AppState;
use crate::error::{EngineError, ErrorResponse};

/// Default and maximum number of audit entries returned per request.
const PRICE_LOG_CAP: usize = 50;

/// `POST /price-changes` — Catalog hook fired after a committed price edit.
///
/// Settlement runs synchronously; the response carries the audit entry
/// and the outcome counts for every monitor that matched.
///
/// # Errors
///
/// Returns [`EngineError::InvalidRequest`] when the price did not change.
#[utoipa::path(
    post,
    path = "/api/v1/price-changes",
    tag = "Prices",
    summary = "Record a price change",
    description = "Writes the audit entry, then settles every active monitor whose target covers the new price. One monitor's failure never blocks the log entry or the remaining monitors.",
    request_body = PriceChangeRequest,
    responses(
        (status = 200, description = "Audit entry and settlement counts", body = PriceChangeResponse),
        (status = 400, description = "Price did not change", body = ErrorResponse),
    )
)]
pub async fn record_price_change(
    State(state): State<AppState>,
    Json(req): Json<PriceChangeRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let outcome = state
        .settlement
        .handle_price_change(
            req.product_id,
            req.product_name,
            req.old_price,
            req.new_price,
            req.changed_by,
        )
        .await?;
    Ok(Json(PriceChangeResponse::from(outcome)))
}

/// `GET /price-changes` — Most recent audit entries, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/price-changes",
    tag = "Prices",
    summary = "List recent price changes",
    description = "Returns up to `limit` audit entries (default and cap 50), newest first.",
    params(PriceLogQuery),
    responses(
        (status = 200, description = "Recent price changes", body = PriceLogResponse),
    )
)]
pub async fn list_price_changes(
    State(state): State<AppState>,
    Query(query): Query<PriceLogQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(PRICE_LOG_CAP).min(PRICE_LOG_CAP);
    let data = state.autopay.recent_price_changes(limit).await;
    let total = data.len();
    Json(PriceLogResponse { data, total })
}

/// Price-change routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/price-changes",
        post(record_price_change).get(list_price_changes),
    )
}
