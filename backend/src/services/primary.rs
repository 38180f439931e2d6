//! Primary forecast generator
//!
//! Produces the baseline series for a horizon: from the trained prediction
//! model when it answers in time, otherwise from the seasonal table plus
//! bounded noise.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use shared::{
    clamp_precipitation, lookahead_confidence, seasonal, ForecastPeriod, PointSource,
    TimeSeriesPoint,
};

use crate::error::{AppError, AppResult};
use crate::external::prediction::{ForecastModel, ModelPrediction};
use crate::services::noise::NoiseSource;

/// Confidence decay for model output: 0.90 falling 0.02 per step, floor 0.60
const MODEL_CONFIDENCE: (f64, f64, f64) = (0.90, 0.02, 0.60);

/// Confidence decay for simulated output: 0.70 falling 0.02 per step, floor 0.40
const SIMULATED_CONFIDENCE: (f64, f64, f64) = (0.70, 0.02, 0.40);

/// Daily rain amount spread around the seasonal mean
const DAILY_VARIATION_MM: f64 = 2.5;

/// Baseline series and whether the trained model produced it
#[derive(Debug, Clone)]
pub struct PrimaryForecast {
    pub points: Vec<TimeSeriesPoint>,
    pub from_model: bool,
}

/// Anything able to produce the baseline series
#[async_trait]
pub trait PrimaryForecaster: Send + Sync {
    /// Baseline series for `period`, generated on `generated_on`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] only when no series at all can be produced.
    async fn generate(&self, period: ForecastPeriod, generated_on: NaiveDate) -> AppResult<PrimaryForecast>;
}

pub struct PrimaryForecastGenerator {
    model: Option<Arc<dyn ForecastModel>>,
    noise: Arc<NoiseSource>,
    timeout: Duration,
}

impl PrimaryForecastGenerator {
    pub fn new(model: Option<Arc<dyn ForecastModel>>, noise: Arc<NoiseSource>, timeout: Duration) -> Self {
        Self {
            model,
            noise,
            timeout,
        }
    }

    async fn from_model(
        &self,
        model: &dyn ForecastModel,
        period: ForecastPeriod,
        dates: &[NaiveDate],
    ) -> AppResult<Vec<TimeSeriesPoint>> {
        let predictions = tokio::time::timeout(self.timeout, model.predict(period, dates.len()))
            .await
            .map_err(|_| AppError::Timeout(self.timeout, "prediction model"))??;

        if predictions.len() < dates.len() {
            return Err(AppError::MalformedResponse(format!(
                "expected {} predictions, got {}",
                dates.len(),
                predictions.len()
            )));
        }
        if let Some(bad) = predictions.iter().find(|p| !p.predicted_value.is_finite()) {
            return Err(AppError::MalformedResponse(format!(
                "non-finite prediction at step {}",
                bad.day_index
            )));
        }

        // Re-dated onto our horizon; the model's own date strings are informational
        Ok(dates
            .iter()
            .zip(predictions.iter())
            .enumerate()
            .map(|(index, (date, prediction))| self.model_point(*date, index, prediction))
            .collect())
    }

    fn model_point(&self, date: NaiveDate, index: usize, prediction: &ModelPrediction) -> TimeSeriesPoint {
        let (base, decay, floor) = MODEL_CONFIDENCE;
        let decayed = lookahead_confidence(base, decay, floor, index);
        let confidence = prediction.model_confidence.clamp(0.0, 1.0).min(decayed.max(floor));
        self.derive_point(date, prediction.predicted_value, PointSource::Model)
            .with_confidence(confidence)
    }

    /// Seasonal simulation for every target date
    pub fn simulate(&self, dates: &[NaiveDate]) -> Vec<TimeSeriesPoint> {
        let (base, decay, floor) = SIMULATED_CONFIDENCE;
        dates
            .iter()
            .enumerate()
            .map(|(index, date)| {
                let precipitation = self.simulated_precipitation(*date);
                self.derive_point(*date, precipitation, PointSource::Simulated)
                    .with_confidence(lookahead_confidence(base, decay, floor, index))
            })
            .collect()
    }

    /// Seasonal mean plus day-of-year modulation plus noise, gated by a rain draw
    fn simulated_precipitation(&self, date: NaiveDate) -> f64 {
        let baseline = seasonal::baseline(date.month0());
        let rain_probability = (baseline.precipitation_mm / 10.0).clamp(0.2, 0.9);
        if !self.noise.chance(rain_probability) {
            return 0.0;
        }
        let raw = baseline.precipitation_mm
            + seasonal::seasonal_adjustment(date.ordinal())
            + self.noise.jitter(DAILY_VARIATION_MM);
        clamp_precipitation(raw)
    }

    /// Secondary fields follow precipitation
    fn derive_point(&self, date: NaiveDate, precipitation: f64, source: PointSource) -> TimeSeriesPoint {
        let precipitation = clamp_precipitation(precipitation);
        let baseline = seasonal::baseline(date.month0());
        let noise = &self.noise;

        let mut point = TimeSeriesPoint::new(date, precipitation).with_source(source);
        point.temperature = Some(baseline.temperature_c + precipitation * 0.1 + noise.jitter(1.0));
        point.humidity = Some((75.0 + precipitation * 2.0 + noise.jitter(5.0)).clamp(60.0, 95.0));
        point.wind_speed = Some((8.0 + noise.jitter(3.0)).max(0.0));
        point.pressure = Some(seasonal::station_pressure_hpa());
        point.flow_rate = Some((150.0 + precipitation * 3.0 + noise.jitter(10.0)).max(0.0));
        point.water_quality = Some((85.0 - precipitation * 0.5 + noise.jitter(3.0)).clamp(70.0, 95.0));
        point
    }
}

#[async_trait]
impl PrimaryForecaster for PrimaryForecastGenerator {
    async fn generate(&self, period: ForecastPeriod, generated_on: NaiveDate) -> AppResult<PrimaryForecast> {
        let dates = period.horizon_dates(generated_on)?;

        if let Some(model) = &self.model {
            match self.from_model(model.as_ref(), period, &dates).await {
                Ok(points) => {
                    tracing::info!(%period, points = points.len(), "Primary forecast from prediction model");
                    return Ok(PrimaryForecast {
                        points,
                        from_model: true,
                    });
                }
                Err(e) => {
                    tracing::warn!(%period, error = %e, "Prediction model failed, simulating primary forecast");
                }
            }
        }

        Ok(PrimaryForecast {
            points: self.simulate(&dates),
            from_model: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::prediction::ModelHealth;

    struct FixedModel(Vec<f64>);

    #[async_trait]
    impl ForecastModel for FixedModel {
        async fn predict(&self, _period: ForecastPeriod, steps: usize) -> AppResult<Vec<ModelPrediction>> {
            Ok(self
                .0
                .iter()
                .take(steps)
                .enumerate()
                .map(|(i, v)| ModelPrediction {
                    date: String::new(),
                    predicted_value: *v,
                    confidence_interval_lower: None,
                    confidence_interval_upper: None,
                    model_confidence: 0.9 - i as f64 * 0.02,
                    day_index: i,
                })
                .collect())
        }

        async fn health(&self) -> AppResult<ModelHealth> {
            Ok(ModelHealth {
                status: "healthy".into(),
                model_loaded: true,
            })
        }
    }

    fn generator(model: Option<Arc<dyn ForecastModel>>) -> PrimaryForecastGenerator {
        PrimaryForecastGenerator::new(model, Arc::new(NoiseSource::seeded(3)), Duration::from_secs(1))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 20).unwrap()
    }

    #[tokio::test]
    async fn test_model_values_are_used_and_clamped() {
        let model = Arc::new(FixedModel(vec![5.0, -3.2, 22.0, 38.0, 8.0, 0.0, 30.0]));
        let forecast = generator(Some(model)).generate(ForecastPeriod::Daily, today()).await.unwrap();

        assert!(forecast.from_model);
        let values: Vec<f64> = forecast.points.iter().map(|p| p.precipitation).collect();
        assert_eq!(values, vec![5.0, 0.0, 22.0, 38.0, 8.0, 0.0, 30.0]);
        assert!(forecast.points.iter().all(|p| p.source == Some(PointSource::Model)));
        assert_eq!(forecast.points[0].date, NaiveDate::from_ymd_opt(2024, 4, 21).unwrap());
    }

    #[tokio::test]
    async fn test_short_model_output_falls_back_to_simulation() {
        let model = Arc::new(FixedModel(vec![5.0, 6.0]));
        let forecast = generator(Some(model)).generate(ForecastPeriod::Daily, today()).await.unwrap();

        assert!(!forecast.from_model);
        assert_eq!(forecast.points.len(), 7);
        assert!(forecast.points.iter().all(|p| p.source == Some(PointSource::Simulated)));
    }

    #[tokio::test]
    async fn test_simulation_matches_horizon() {
        for period in ForecastPeriod::ALL {
            let forecast = generator(None).generate(period, today()).await.unwrap();
            assert_eq!(forecast.points.len(), period.horizon());
            shared::validate_series(&forecast.points, period, today()).unwrap();
            assert!(forecast.points.iter().all(|p| p.precipitation >= 0.0));
        }
    }

    #[tokio::test]
    async fn test_confidence_decays_with_lookahead() {
        let forecast = generator(None).generate(ForecastPeriod::Monthly, today()).await.unwrap();
        let confidences: Vec<f64> = forecast.points.iter().filter_map(|p| p.confidence).collect();
        assert_eq!(confidences.len(), 30);
        assert!(confidences.windows(2).all(|w| w[1] <= w[0]));
        assert!(confidences.iter().all(|c| *c >= 0.40 - 1e-9));
    }
}
