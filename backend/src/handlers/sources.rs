//! HTTP handlers for current-conditions sources

use axum::{extract::State, Json};
use shared::SourceSnapshot;

use crate::AppState;

/// Current snapshot from every source, live or simulated
pub async fn get_sources(State(state): State<AppState>) -> Json<Vec<SourceSnapshot>> {
    Json(state.aggregator.current_snapshots().await)
}
