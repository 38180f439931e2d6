//! Weather station API client for current conditions
//!
//! Reads the latest observation of the meteorological station network
//! nearest to the Papallacta intake.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use shared::{GpsCoordinates, Provenance, SourceKind, SourceSnapshot};

use crate::error::AppResult;

/// Weather station API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
}

/// Station API response for the latest observation
#[derive(Debug, Deserialize)]
struct StationObservation {
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    temperature: f64,
    #[serde(default)]
    precipitation: Option<f64>,
    #[serde(default)]
    humidity: Option<f64>,
    #[serde(default)]
    wind_speed: Option<f64>,
    #[serde(default)]
    pressure: Option<f64>,
}

impl WeatherClient {
    /// Create a new WeatherClient
    pub fn new(base_url: String, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: super::http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the latest observation near the given coordinates
    pub async fn get_current_conditions(&self, location: GpsCoordinates) -> AppResult<SourceSnapshot> {
        let url = format!(
            "{}/observations/latest?lat={}&lon={}",
            self.base_url, location.latitude, location.longitude
        );

        let data: StationObservation = super::get_json(&self.client, &url).await?;

        Ok(convert_observation(data))
    }
}

/// Convert a station observation to a live snapshot
fn convert_observation(data: StationObservation) -> SourceSnapshot {
    let mut snapshot = SourceSnapshot::empty(
        SourceKind::Weather,
        Provenance::Live,
        data.timestamp.unwrap_or_else(Utc::now),
    );
    snapshot.temperature = Some(data.temperature);
    snapshot.precipitation = data.precipitation.map(|p| p.max(0.0));
    snapshot.humidity = data.humidity;
    snapshot.wind_speed = data.wind_speed;
    snapshot.pressure = data.pressure;
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_conversion() {
        let data: StationObservation = serde_json::from_str(
            r#"{"temperature": 9.4, "precipitation": -0.2, "humidity": 88.0}"#,
        )
        .unwrap();

        let snapshot = convert_observation(data);
        assert_eq!(snapshot.source, SourceKind::Weather);
        assert!(snapshot.is_live());
        assert_eq!(snapshot.temperature, Some(9.4));
        assert_eq!(snapshot.precipitation, Some(0.0));
        assert_eq!(snapshot.wind_speed, None);
    }

    #[test]
    fn test_observation_requires_temperature() {
        assert!(serde_json::from_str::<StationObservation>(r#"{"humidity": 80.0}"#).is_err());
    }
}
