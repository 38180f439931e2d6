//! External API integrations

pub mod generative;
pub mod operational;
pub mod prediction;
pub mod regulatory;
pub mod weather;

pub use generative::{GeminiClient, GenerativeModel};
pub use operational::OperationalClient;
pub use prediction::{ForecastModel, PredictionClient};
pub use regulatory::RegulatoryClient;
pub use weather::WeatherClient;

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

/// Build an HTTP client with a per-request timeout
pub(crate) fn http_client(timeout: Duration) -> AppResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

/// GET a JSON document, treating any non-2xx status as unavailable
pub(crate) async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> AppResult<T> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::UpstreamUnavailable(format!("Request to {} failed: {}", url, e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::UpstreamUnavailable(format!(
            "{} returned {} - {}",
            url, status, body
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::MalformedResponse(format!("Failed to parse response from {}: {}", url, e)))
}
