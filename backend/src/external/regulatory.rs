//! Government water and risk agency feed
//!
//! Only the current advisory and the published quality index are read.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use shared::{Provenance, SourceKind, SourceSnapshot};

use crate::error::AppResult;

#[derive(Clone)]
pub struct RegulatoryClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AdvisoryResponse {
    #[serde(default)]
    issued_at: Option<DateTime<Utc>>,
    /// Agency alert colour or level, e.g. "green", "yellow"
    advisory: String,
    #[serde(default)]
    water_quality_index: Option<f64>,
}

impl RegulatoryClient {
    pub fn new(base_url: String, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: super::http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the advisory currently in force for the catchment
    pub async fn get_current_advisory(&self) -> AppResult<SourceSnapshot> {
        let url = format!("{}/advisories/current", self.base_url);
        let data: AdvisoryResponse = super::get_json(&self.client, &url).await?;

        let mut snapshot = SourceSnapshot::empty(
            SourceKind::Regulatory,
            Provenance::Live,
            data.issued_at.unwrap_or_else(Utc::now),
        );
        snapshot.advisory = Some(data.advisory);
        snapshot.water_quality = data.water_quality_index;
        Ok(snapshot)
    }
}
