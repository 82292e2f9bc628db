//! autopay-engine server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use autopay_engine::api;
use autopay_engine::app_state::AppState;
use autopay_engine::config::EngineConfig;
use autopay_engine::domain::{EventBus, Ledger, MonitorRegistry, OrderStore, PriceChangeLog};
use autopay_engine::persistence::{PostgresPersistence, spawn_event_log, spawn_retention};
use autopay_engine::service::{AutopayService, SettlementEngine};
use autopay_engine::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = EngineConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting autopay-engine");

    // Build domain layer
    let ledger = Arc::new(Ledger::new());
    let registry = Arc::new(MonitorRegistry::new());
    let orders = Arc::new(OrderStore::new());
    let price_log = Arc::new(PriceChangeLog::new());
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Build service layer
    let autopay = Arc::new(AutopayService::new(
        Arc::clone(&ledger),
        Arc::clone(&registry),
        Arc::clone(&orders),
        Arc::clone(&price_log),
        event_bus.clone(),
    ));
    let settlement = Arc::new(SettlementEngine::new(
        ledger,
        registry,
        orders,
        price_log,
        event_bus.clone(),
    ));

    // Optional durable event log
    if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect_lazy(&config.database_url)?;
        let persistence = PostgresPersistence::new(pool);
        let _ = spawn_event_log(persistence.clone(), &event_bus);
        let _ = spawn_retention(persistence, config.cleanup_after_days);
        tracing::info!("durable event log enabled");
    }

    // Build application state
    let app_state = AppState {
        autopay,
        settlement,
        event_bus,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
