//! Current-conditions snapshots from the source adapters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream a snapshot was requested from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Meteorological station network
    Weather,
    /// Utility SCADA: flow, reservoir, treatment
    Operational,
    /// Government water and risk agencies
    Regulatory,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Weather => "weather",
            SourceKind::Operational => "operational",
            SourceKind::Regulatory => "regulatory",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a snapshot came from a live call or a local simulation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Live,
    Simulated,
}

/// A current-conditions reading from one adapter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceSnapshot {
    pub source: SourceKind,
    pub provenance: Provenance,
    pub observed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservoir_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_quality: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
}

impl SourceSnapshot {
    /// Empty snapshot to be filled in by an adapter
    pub fn empty(source: SourceKind, provenance: Provenance, observed_at: DateTime<Utc>) -> Self {
        Self {
            source,
            provenance,
            observed_at,
            temperature: None,
            precipitation: None,
            humidity: None,
            wind_speed: None,
            pressure: None,
            flow_rate: None,
            reservoir_level: None,
            water_quality: None,
            advisory: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.provenance == Provenance::Live
    }
}
