//! HTTP handlers for forecast endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{Alert, ForecastPeriod, HybridForecastResult};

use crate::error::AppResult;
use crate::AppState;

/// Get the forecast for a period, from cache when fresh
pub async fn get_forecast(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> AppResult<Json<HybridForecastResult>> {
    let period: ForecastPeriod = period.parse()?;
    let result = state.aggregator.generate(period).await?;
    Ok(Json(result))
}

/// Regenerate the forecast for a period, bypassing the cache
pub async fn refresh_forecast(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> AppResult<Json<HybridForecastResult>> {
    let period: ForecastPeriod = period.parse()?;
    tracing::info!(%period, "Forecast refresh requested");
    let result = state.aggregator.refresh(period).await?;
    Ok(Json(result))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastAlertsResponse {
    pub period: ForecastPeriod,
    pub generated_at: DateTime<Utc>,
    pub alerts: Vec<Alert>,
}

/// Alerts of the current forecast for a period
pub async fn get_forecast_alerts(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> AppResult<Json<ForecastAlertsResponse>> {
    let period: ForecastPeriod = period.parse()?;
    let result = state.aggregator.generate(period).await?;
    Ok(Json(ForecastAlertsResponse {
        period,
        generated_at: result.generated_at,
        alerts: result.alerts,
    }))
}
