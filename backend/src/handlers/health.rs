//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub prediction_model: String,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // Check prediction model reachability
    let prediction_model = match &state.prediction {
        Some(model) => match model.health().await {
            Ok(health) if health.model_loaded => "connected".to_string(),
            Ok(_) => "not_loaded".to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Prediction model health check failed");
                "unreachable".to_string()
            }
        },
        None => "not_configured".to_string(),
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
        prediction_model,
    })
}
