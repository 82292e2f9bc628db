//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All endpoints are mounted under `/api/v1`; system routes live at the
//! root. With the `swagger-ui` feature enabled the generated OpenAPI
//! document is served at `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "autopay-engine",
        description = "Wallet ledger and price-triggered auto-purchase engine"
    ),
    paths(
        handlers::monitor::create_monitor,
        handlers::monitor::list_monitors,
        handlers::monitor::monitor_history,
        handlers::monitor::cancel_monitor,
        handlers::monitor::update_target,
        handlers::price::record_price_change,
        handlers::price::list_price_changes,
        handlers::wallet::get_wallet,
        handlers::wallet::deposit,
        handlers::wallet::list_orders,
        handlers::system::health_handler,
    ),
    components(schemas(
        crate::domain::Money,
        crate::domain::MonitorId,
        crate::domain::UserId,
        crate::domain::ProductId,
        crate::domain::Monitor,
        crate::domain::MonitorStatus,
        crate::domain::ProductSnapshot,
        crate::domain::Order,
        crate::domain::OrderLine,
        crate::domain::PriceChangeRecord,
        crate::domain::Wallet,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    ))
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
