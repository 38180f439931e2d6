//! Route definitions for the Papallacta forecast service

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/forecast", forecast_routes())
        .route("/alerts/classify", post(handlers::classify_series))
        .route("/sources", get(handlers::get_sources))
        .route("/seasonal", get(handlers::get_seasonal_table))
}

/// Forecast routes, keyed by period (daily, monthly, yearly)
fn forecast_routes() -> Router<AppState> {
    Router::new()
        .route("/:period", get(handlers::get_forecast))
        .route("/:period/refresh", post(handlers::refresh_forecast))
        .route("/:period/alerts", get(handlers::get_forecast_alerts))
}
