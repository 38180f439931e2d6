//! HTTP handlers for ad-hoc alert classification

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use shared::{
    prepare_series, Alert, AlertClassifier, AlertSeverity, ClassifierMode, ForecastError, TimeSeriesPoint,
};

use crate::error::{AppError, AppResult};
use crate::AppState;

/// Upper bound on points accepted in one request
const MAX_SERIES_LEN: usize = 366;

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub series: Vec<TimeSeriesPoint>,
    /// Defaults to the configured mode
    #[serde(default)]
    pub mode: Option<ClassifierMode>,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub mode: ClassifierMode,
    /// Severity of every input point, in order
    pub severities: Vec<AlertSeverity>,
    pub alerts: Vec<Alert>,
}

/// Classify a caller-supplied series with the configured thresholds
pub async fn classify_series(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> AppResult<Json<ClassifyResponse>> {
    let ClassifyRequest { mut series, mode } = request;

    if series.len() > MAX_SERIES_LEN {
        return Err(AppError::invalid(
            "series",
            format!("Series must not exceed {} points", MAX_SERIES_LEN),
            format!("La serie no debe superar {} puntos", MAX_SERIES_LEN),
        ));
    }
    prepare_series(&mut series).map_err(|err| match err {
        ForecastError::EmptySeries => AppError::invalid(
            "series",
            "Series must contain at least one point",
            "La serie debe contener al menos un punto",
        ),
        _ => AppError::invalid(
            "series",
            "Dates must be strictly increasing",
            "Las fechas deben ser estrictamente crecientes",
        ),
    })?;

    let configured = state.aggregator.classifier();
    let mode = mode.unwrap_or(configured.mode);
    let classifier = AlertClassifier::new(configured.thresholds, mode);

    Ok(Json(ClassifyResponse {
        mode,
        severities: classifier.severities(&series),
        alerts: classifier.classify(&series),
    }))
}
