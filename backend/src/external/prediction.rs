//! Prediction model client
//!
//! Client for the trained time-series model service. The service exposes
//! `GET /predictions/{period}?days=N` and `GET /health`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::ForecastPeriod;

use crate::error::{AppError, AppResult};

/// One predicted step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelPrediction {
    pub date: String,
    /// Predicted precipitation (mm)
    pub predicted_value: f64,
    #[serde(default)]
    pub confidence_interval_lower: Option<f64>,
    #[serde(default)]
    pub confidence_interval_upper: Option<f64>,
    pub model_confidence: f64,
    pub day_index: usize,
}

/// Response from the predictions endpoint
#[derive(Debug, Deserialize)]
struct PredictionsResponse {
    success: bool,
    #[serde(default)]
    predictions: Vec<ModelPrediction>,
    #[serde(default)]
    error: Option<String>,
}

/// Model service health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelHealth {
    pub status: String,
    pub model_loaded: bool,
}

/// A remote model able to produce a precipitation series
#[async_trait]
pub trait ForecastModel: Send + Sync {
    /// Predict `steps` values for `period`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] if the model is unreachable or answers with an error.
    async fn predict(&self, period: ForecastPeriod, steps: usize) -> AppResult<Vec<ModelPrediction>>;

    /// Whether the model is up and loaded
    async fn health(&self) -> AppResult<ModelHealth>;
}

/// HTTP client for the prediction service
#[derive(Clone)]
pub struct PredictionClient {
    client: Client,
    base_url: String,
}

impl PredictionClient {
    pub fn new(base_url: String, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: super::http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ForecastModel for PredictionClient {
    async fn predict(&self, period: ForecastPeriod, steps: usize) -> AppResult<Vec<ModelPrediction>> {
        let steps = steps.min(period.max_model_steps());
        let url = format!("{}/predictions/{}?days={}", self.base_url, period, steps);

        let response: PredictionsResponse = super::get_json(&self.client, &url).await?;
        if !response.success {
            return Err(AppError::UpstreamUnavailable(
                response
                    .error
                    .unwrap_or_else(|| "prediction service reported failure".to_string()),
            ));
        }

        Ok(response.predictions)
    }

    async fn health(&self) -> AppResult<ModelHealth> {
        let url = format!("{}/health", self.base_url);
        super::get_json(&self.client, &url).await
    }
}
