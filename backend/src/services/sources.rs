//! Source adapters for current conditions
//!
//! Each adapter tries its upstream once, bounded by a timeout, and falls
//! back to a snapshot simulated from the seasonal table. Adapters never
//! return an error; the snapshot's `provenance` says which branch was taken.

use std::f64::consts::PI;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Timelike, Utc};
use shared::{local_offset, seasonal, Provenance, SourceKind, SourceSnapshot, PAPALLACTA};

use crate::error::{AppError, AppResult};
use crate::external::{OperationalClient, RegulatoryClient, WeatherClient};
use crate::services::noise::NoiseSource;

/// A best-effort current-conditions source
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Live snapshot when the upstream answers in time, simulated otherwise
    async fn fetch_current_conditions(&self) -> SourceSnapshot;
}

/// Run `call` under `timeout`, or simulate when there is no upstream or it fails
async fn live_or_simulated<F>(
    kind: SourceKind,
    timeout: Duration,
    call: Option<F>,
    simulate: impl FnOnce() -> SourceSnapshot,
) -> SourceSnapshot
where
    F: Future<Output = AppResult<SourceSnapshot>>,
{
    let Some(call) = call else {
        tracing::debug!(source = %kind, "No upstream configured, using simulated snapshot");
        return simulate();
    };

    let outcome = match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(timeout, "source adapter")),
    };

    match outcome {
        Ok(snapshot) => {
            tracing::info!(source = %kind, "Live snapshot received");
            snapshot
        }
        Err(e) => {
            tracing::warn!(source = %kind, error = %e, "Upstream failed, using simulated snapshot");
            simulate()
        }
    }
}

// ============================================================================
// Weather
// ============================================================================

pub struct WeatherAdapter {
    client: Option<WeatherClient>,
    noise: Arc<NoiseSource>,
    timeout: Duration,
}

impl WeatherAdapter {
    pub fn new(client: Option<WeatherClient>, noise: Arc<NoiseSource>, timeout: Duration) -> Self {
        Self {
            client,
            noise,
            timeout,
        }
    }

    /// Seasonal snapshot with a diurnal temperature cycle peaking mid-afternoon
    pub fn simulate(&self, now: DateTime<Utc>) -> SourceSnapshot {
        let local = now.with_timezone(&local_offset());
        let baseline = seasonal::baseline(local.month0());
        let hour = f64::from(local.hour()) + f64::from(local.minute()) / 60.0;
        let diurnal = 3.0 * (2.0 * PI * (hour - 9.0) / 24.0).sin();

        let raining = self.noise.chance((baseline.precipitation_mm / 12.0).min(0.9));
        let precipitation = if raining {
            baseline.precipitation_mm * self.noise.factor(0.6, 0.2, 2.0)
        } else {
            0.0
        };

        let mut snapshot = SourceSnapshot::empty(SourceKind::Weather, Provenance::Simulated, now);
        snapshot.temperature = Some(baseline.temperature_c + diurnal + self.noise.jitter(0.8));
        snapshot.precipitation = Some(precipitation);
        snapshot.humidity = Some((80.0 + 2.0 * precipitation + self.noise.jitter(8.0)).clamp(60.0, 98.0));
        snapshot.wind_speed = Some((8.0 + self.noise.jitter(3.0)).max(0.0));
        snapshot.pressure = Some(seasonal::station_pressure_hpa() + self.noise.jitter(1.5));
        snapshot
    }
}

#[async_trait]
impl SourceAdapter for WeatherAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Weather
    }

    async fn fetch_current_conditions(&self) -> SourceSnapshot {
        let call = self
            .client
            .as_ref()
            .map(|client| client.get_current_conditions(PAPALLACTA.coordinates));
        live_or_simulated(self.kind(), self.timeout, call, || self.simulate(Utc::now())).await
    }
}

// ============================================================================
// Operational (SCADA)
// ============================================================================

/// Nominal intake flow (l/s) with no rain
const BASE_FLOW_RATE: f64 = 150.0;

pub struct OperationalAdapter {
    client: Option<OperationalClient>,
    noise: Arc<NoiseSource>,
    timeout: Duration,
}

impl OperationalAdapter {
    pub fn new(client: Option<OperationalClient>, noise: Arc<NoiseSource>, timeout: Duration) -> Self {
        Self {
            client,
            noise,
            timeout,
        }
    }

    pub fn simulate(&self, now: DateTime<Utc>) -> SourceSnapshot {
        let baseline = seasonal::baseline(now.with_timezone(&local_offset()).month0());
        let rain = baseline.precipitation_mm;

        let mut snapshot = SourceSnapshot::empty(SourceKind::Operational, Provenance::Simulated, now);
        snapshot.flow_rate = Some((BASE_FLOW_RATE + 3.0 * rain) * self.noise.factor(0.15, 0.7, 1.3));
        snapshot.reservoir_level = Some((70.0 + 2.0 * rain + self.noise.jitter(5.0)).clamp(0.0, 100.0));
        snapshot.water_quality = Some((85.0 - 0.5 * rain + self.noise.jitter(3.0)).clamp(70.0, 95.0));
        snapshot
    }
}

#[async_trait]
impl SourceAdapter for OperationalAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Operational
    }

    async fn fetch_current_conditions(&self) -> SourceSnapshot {
        let call = self.client.as_ref().map(|client| client.get_current_telemetry());
        live_or_simulated(self.kind(), self.timeout, call, || self.simulate(Utc::now())).await
    }
}

// ============================================================================
// Regulatory
// ============================================================================

pub struct RegulatoryAdapter {
    client: Option<RegulatoryClient>,
    noise: Arc<NoiseSource>,
    timeout: Duration,
}

impl RegulatoryAdapter {
    pub fn new(client: Option<RegulatoryClient>, noise: Arc<NoiseSource>, timeout: Duration) -> Self {
        Self {
            client,
            noise,
            timeout,
        }
    }

    pub fn simulate(&self, now: DateTime<Utc>) -> SourceSnapshot {
        let month0 = now.with_timezone(&local_offset()).month0();
        let advisory = if seasonal::is_dry_month(month0) {
            "green"
        } else {
            "yellow"
        };

        let mut snapshot = SourceSnapshot::empty(SourceKind::Regulatory, Provenance::Simulated, now);
        snapshot.advisory = Some(advisory.to_string());
        snapshot.water_quality = Some((88.0 + self.noise.jitter(4.0)).clamp(0.0, 100.0));
        snapshot
    }
}

#[async_trait]
impl SourceAdapter for RegulatoryAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Regulatory
    }

    async fn fetch_current_conditions(&self) -> SourceSnapshot {
        let call = self.client.as_ref().map(|client| client.get_current_advisory());
        live_or_simulated(self.kind(), self.timeout, call, || self.simulate(Utc::now())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noise() -> Arc<NoiseSource> {
        Arc::new(NoiseSource::seeded(11))
    }

    #[tokio::test]
    async fn test_adapters_without_upstream_simulate() {
        let timeout = Duration::from_millis(200);
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![
            Box::new(WeatherAdapter::new(None, noise(), timeout)),
            Box::new(OperationalAdapter::new(None, noise(), timeout)),
            Box::new(RegulatoryAdapter::new(None, noise(), timeout)),
        ];

        for adapter in adapters {
            let snapshot = adapter.fetch_current_conditions().await;
            assert_eq!(snapshot.source, adapter.kind());
            assert_eq!(snapshot.provenance, Provenance::Simulated);
        }
    }

    #[tokio::test]
    async fn test_unreachable_upstream_falls_back() {
        let timeout = Duration::from_millis(500);
        let client = WeatherClient::new("http://127.0.0.1:9".to_string(), timeout).unwrap();
        let adapter = WeatherAdapter::new(Some(client), noise(), timeout);

        let snapshot = adapter.fetch_current_conditions().await;
        assert!(!snapshot.is_live());
        assert!(snapshot.temperature.is_some());
    }

    #[test]
    fn test_simulated_weather_is_bounded_and_reproducible() {
        let now = Utc.with_ymd_and_hms(2024, 4, 15, 20, 0, 0).unwrap();
        let a = WeatherAdapter::new(None, noise(), Duration::from_secs(1)).simulate(now);
        let b = WeatherAdapter::new(None, noise(), Duration::from_secs(1)).simulate(now);
        assert_eq!(a, b);

        let temperature = a.temperature.unwrap();
        assert!(temperature > 5.0 && temperature < 15.0, "got {temperature}");
        assert!(a.precipitation.unwrap() >= 0.0);
        let humidity = a.humidity.unwrap();
        assert!((60.0..=98.0).contains(&humidity));
    }

    #[test]
    fn test_simulated_flow_is_clamped() {
        let adapter = OperationalAdapter::new(None, noise(), Duration::from_secs(1));
        let now = Utc.with_ymd_and_hms(2024, 4, 15, 12, 0, 0).unwrap();
        for _ in 0..200 {
            let flow = adapter.simulate(now).flow_rate.unwrap();
            let nominal = BASE_FLOW_RATE + 3.0 * 8.9;
            assert!(flow >= nominal * 0.7 - 1e-9 && flow <= nominal * 1.3 + 1e-9);
        }
    }

    #[test]
    fn test_regulatory_advisory_follows_season() {
        let adapter = RegulatoryAdapter::new(None, noise(), Duration::from_secs(1));
        let july = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        let april = Utc.with_ymd_and_hms(2024, 4, 15, 12, 0, 0).unwrap();
        assert_eq!(adapter.simulate(july).advisory.as_deref(), Some("green"));
        assert_eq!(adapter.simulate(april).advisory.as_deref(), Some("yellow"));
    }
}
