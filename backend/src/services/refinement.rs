//! Forecast refinement step
//!
//! Hands the primary series and the current snapshots to a generative model
//! and asks for an adjusted series plus alerts. The answer is validated
//! strictly here; the aggregator still treats it as untrusted.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::{
    Alert, AlertGrade, AlertSeverity, ForecastPeriod, PointSource, SourceSnapshot, TimeSeriesPoint,
    PAPALLACTA, QUITO,
};

use crate::error::{AppError, AppResult};
use crate::external::generative::GenerativeModel;

/// Validated answer of the generative model
#[derive(Debug, Clone)]
pub struct RefinedForecast {
    pub forecast: Vec<TimeSeriesPoint>,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Deserialize)]
struct RefinementAnswer {
    forecast: Vec<RefinedPoint>,
    alerts: Vec<RefinedAlert>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefinedPoint {
    date: NaiveDate,
    precipitation: f64,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    humidity: Option<f64>,
    #[serde(default)]
    wind_speed: Option<f64>,
    #[serde(default)]
    pressure: Option<f64>,
    #[serde(default)]
    flow_rate: Option<f64>,
    #[serde(default)]
    water_quality: Option<f64>,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RefinedAlert {
    title: String,
    date: NaiveDate,
    precipitation: f64,
    severity: AlertSeverity,
    #[serde(default)]
    grade: Option<AlertGrade>,
    #[serde(default)]
    message: Option<String>,
}

pub struct ForecastRefiner {
    model: Arc<dyn GenerativeModel>,
    timeout: Duration,
}

impl ForecastRefiner {
    pub fn new(model: Arc<dyn GenerativeModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// Ask the generative model for a refined series over `target_dates`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Timeout`] when the model does not answer in time and
    /// [`AppError::MalformedResponse`] when the answer fails validation.
    pub async fn refine(
        &self,
        primary: &[TimeSeriesPoint],
        period: ForecastPeriod,
        snapshots: &[SourceSnapshot],
        target_dates: &[NaiveDate],
    ) -> AppResult<RefinedForecast> {
        let prompt = build_prompt(primary, period, snapshots, target_dates)?;
        let schema = response_schema();

        tracing::debug!(model = self.model.model_name(), %period, "Requesting forecast refinement");
        let answer = tokio::time::timeout(self.timeout, self.model.generate_json(&prompt, &schema))
            .await
            .map_err(|_| AppError::Timeout(self.timeout, "generative model"))??;

        let refined = parse_answer(answer)?;
        tracing::info!(
            %period,
            points = refined.forecast.len(),
            alerts = refined.alerts.len(),
            "Refinement accepted"
        );
        Ok(refined)
    }
}

fn build_prompt(
    primary: &[TimeSeriesPoint],
    period: ForecastPeriod,
    snapshots: &[SourceSnapshot],
    target_dates: &[NaiveDate],
) -> AppResult<String> {
    let primary_json = serde_json::to_string(primary)
        .map_err(|e| AppError::Internal(format!("Failed to encode primary series: {}", e)))?;
    let snapshots_json = serde_json::to_string(snapshots)
        .map_err(|e| AppError::Internal(format!("Failed to encode snapshots: {}", e)))?;
    let dates = target_dates
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        "You are a hydrometeorologist for the water supply line from {src} \
         (lat {src_lat}, lon {src_lon}, {src_elev} m) to {dst} \
         (lat {dst_lat}, lon {dst_lon}, {dst_elev} m).\n\
         Refine the {period} precipitation forecast below using the current conditions.\n\n\
         Primary forecast (mm per point):\n{primary_json}\n\n\
         Current conditions:\n{snapshots_json}\n\n\
         Return a JSON object with exactly two arrays:\n\
         - \"forecast\": one element per target date, in order, each with \"date\" (YYYY-MM-DD), \
         \"precipitation\" (mm, never negative) and optionally \"temperature\", \"humidity\", \
         \"windSpeed\", \"pressure\", \"flowRate\", \"waterQuality\", \"confidence\" (0-1).\n\
         - \"alerts\": zero or more elements, each with \"title\", \"date\", \"precipitation\", \
         \"severity\" (normal, warning or critical) and optionally \"message\".\n\
         Target dates: {dates}",
        src = PAPALLACTA.name,
        src_lat = PAPALLACTA.coordinates.latitude,
        src_lon = PAPALLACTA.coordinates.longitude,
        src_elev = PAPALLACTA.elevation_m,
        dst = QUITO.name,
        dst_lat = QUITO.coordinates.latitude,
        dst_lon = QUITO.coordinates.longitude,
        dst_elev = QUITO.elevation_m,
    ))
}

/// Response schema in the generative API's OpenAPI subset
fn response_schema() -> Value {
    let number = json!({ "type": "NUMBER" });
    let string = json!({ "type": "STRING" });
    json!({
        "type": "OBJECT",
        "properties": {
            "forecast": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "date": string,
                        "precipitation": number,
                        "temperature": number,
                        "humidity": number,
                        "windSpeed": number,
                        "pressure": number,
                        "flowRate": number,
                        "waterQuality": number,
                        "confidence": number
                    },
                    "required": ["date", "precipitation"]
                }
            },
            "alerts": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": string,
                        "date": string,
                        "precipitation": number,
                        "severity": { "type": "STRING", "enum": ["normal", "warning", "critical"] },
                        "message": string
                    },
                    "required": ["title", "date", "precipitation", "severity"]
                }
            }
        },
        "required": ["forecast", "alerts"]
    })
}

/// Strict validation: both arrays present, forecast non-empty, every
/// required field present and finite
fn parse_answer(answer: Value) -> AppResult<RefinedForecast> {
    let answer: RefinementAnswer = serde_json::from_value(answer)
        .map_err(|e| AppError::MalformedResponse(format!("Refinement answer rejected: {}", e)))?;

    if answer.forecast.is_empty() {
        return Err(AppError::MalformedResponse(
            "Refinement answer has an empty forecast".to_string(),
        ));
    }

    let forecast = answer
        .forecast
        .into_iter()
        .enumerate()
        .map(|(index, point)| {
            if !point.precipitation.is_finite() {
                return Err(AppError::MalformedResponse(format!(
                    "Refined point {} has non-finite precipitation",
                    index
                )));
            }
            let mut refined = TimeSeriesPoint::new(point.date, point.precipitation).with_source(PointSource::Refined);
            refined.temperature = point.temperature;
            refined.humidity = point.humidity;
            refined.wind_speed = point.wind_speed;
            refined.pressure = point.pressure;
            refined.flow_rate = point.flow_rate;
            refined.water_quality = point.water_quality;
            refined.confidence = point.confidence;
            Ok(refined)
        })
        .collect::<AppResult<Vec<_>>>()?;

    let alerts = answer
        .alerts
        .into_iter()
        .map(|a| {
            let mut alert = Alert::new(a.date, a.precipitation, a.severity, a.title);
            alert.grade = a.grade;
            alert.message = a.message;
            alert
        })
        .collect();

    Ok(RefinedForecast { forecast, alerts })
}
