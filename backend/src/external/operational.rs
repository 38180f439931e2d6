//! Utility SCADA telemetry client
//!
//! Flow, reservoir and treatment readings along the supply line.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use shared::{Provenance, SourceKind, SourceSnapshot};

use crate::error::AppResult;

#[derive(Clone)]
pub struct OperationalClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TelemetryReading {
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    /// Litres per second at the intake
    flow_rate: f64,
    /// Percent of capacity
    #[serde(default)]
    reservoir_level: Option<f64>,
    /// Treatment plant quality index, 0-100
    #[serde(default)]
    water_quality: Option<f64>,
}

impl OperationalClient {
    pub fn new(base_url: String, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: super::http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the latest telemetry frame
    pub async fn get_current_telemetry(&self) -> AppResult<SourceSnapshot> {
        let url = format!("{}/telemetry/current", self.base_url);
        let data: TelemetryReading = super::get_json(&self.client, &url).await?;

        let mut snapshot = SourceSnapshot::empty(
            SourceKind::Operational,
            Provenance::Live,
            data.timestamp.unwrap_or_else(Utc::now),
        );
        snapshot.flow_rate = Some(data.flow_rate);
        snapshot.reservoir_level = data.reservoir_level;
        snapshot.water_quality = data.water_quality;
        Ok(snapshot)
    }
}
