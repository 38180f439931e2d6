//! Forecast series models

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Alert;
use crate::types::ForecastPeriod;

/// Provenance of a single series point
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PointSource {
    /// Produced by the trained prediction model
    Model,
    /// Seasonal table plus noise, used when the model is unreachable
    Simulated,
    /// Adjusted by the generative refinement step
    Refined,
    /// Emergency seasonal fallback
    Fallback,
}

/// One observation or prediction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    /// Millimetres, never negative
    pub precipitation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_quality: Option<f64>,
    /// 0-1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PointSource>,
}

impl TimeSeriesPoint {
    /// A point carrying only a date and precipitation
    pub fn new(date: NaiveDate, precipitation: f64) -> Self {
        Self {
            date,
            precipitation,
            temperature: None,
            humidity: None,
            wind_speed: None,
            pressure: None,
            flow_rate: None,
            water_quality: None,
            confidence: None,
            source: None,
        }
    }

    pub fn with_source(mut self, source: PointSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Whether the pipeline reached `Done` or had to use the emergency fallback
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineOutcome {
    Complete,
    EmergencyFallback,
}

/// Output of the forecast aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridForecastResult {
    pub period: ForecastPeriod,
    pub generated_at: DateTime<Utc>,
    pub forecast: Vec<TimeSeriesPoint>,
    pub alerts: Vec<Alert>,
    /// Source name to whether it contributed live data
    pub sources: BTreeMap<String, bool>,
    /// Heuristic score in [0, 0.95], not a calibrated probability
    pub confidence: f64,
    pub outcome: PipelineOutcome,
}

impl HybridForecastResult {
    /// Number of sources that contributed
    pub fn contributing_sources(&self) -> usize {
        self.sources.values().filter(|ok| **ok).count()
    }
}
