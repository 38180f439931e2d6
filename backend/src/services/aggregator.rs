//! Forecast aggregator
//!
//! Drives one pipeline run per request:
//! `Idle -> FetchingPrimary | FetchingSnapshots -> Refining -> Finalizing -> Done`,
//! with `EmergencyFallback` reachable from any non-terminal state. Whatever
//! upstream does, a run ends with a gap-free series over the full horizon.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use futures::future::join_all;
use shared::{
    local_date, sanitize_point, seasonal, Alert, AlertClassifier, ForecastPeriod, HybridForecastResult,
    PipelineOutcome, PointSource, SourceSnapshot, TimeSeriesPoint,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::cache::ForecastCache;
use crate::services::primary::PrimaryForecaster;
use crate::services::refinement::{ForecastRefiner, RefinedForecast};
use crate::services::sources::SourceAdapter;

// ============================================================================
// State machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    FetchingPrimary,
    FetchingSnapshots,
    Refining,
    Finalizing,
    Done,
    EmergencyFallback,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::EmergencyFallback)
    }

    /// Primary and snapshot fetches run concurrently, so both fetch states
    /// are entered before either settles
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        match (self, next) {
            (from, EmergencyFallback) => !from.is_terminal(),
            (Idle, FetchingPrimary) => true,
            (FetchingPrimary, FetchingSnapshots) => true,
            (FetchingSnapshots, Refining) => true,
            (FetchingSnapshots, Finalizing) => true,
            (Refining, Finalizing) => true,
            (Finalizing, Done) => true,
            _ => false,
        }
    }
}

/// Transition log of one pipeline run
#[derive(Debug)]
pub struct PipelineRun {
    period: ForecastPeriod,
    history: Vec<PipelineState>,
}

impl PipelineRun {
    pub fn new(period: ForecastPeriod) -> Self {
        Self {
            period,
            history: vec![PipelineState::Idle],
        }
    }

    pub fn state(&self) -> PipelineState {
        self.history.last().copied().unwrap_or(PipelineState::Idle)
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn advance(&mut self, next: PipelineState) -> AppResult<()> {
        let current = self.state();
        if !current.can_transition_to(next) {
            return Err(AppError::Internal(format!(
                "Invalid pipeline transition {:?} -> {:?}",
                current, next
            )));
        }
        tracing::debug!(period = %self.period, from = ?current, to = ?next, "Pipeline transition");
        self.history.push(next);
        Ok(())
    }
}

// ============================================================================
// Confidence
// ============================================================================

/// Additive heuristic weights. The score is a ranking aid, not a probability.
///
/// `emergency` must stay below `base` plus the smallest snapshot weight, so
/// a run with no contributing source always ranks under one with a single
/// live source.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceWeights {
    pub base: f64,
    pub primary_model: f64,
    /// Per live snapshot, in adapter order
    pub snapshots: Vec<f64>,
    pub refinement: f64,
    pub cap: f64,
    /// Fixed score of an emergency fallback result
    pub emergency: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            base: 0.30,
            primary_model: 0.45,
            snapshots: vec![0.20, 0.15, 0.12],
            refinement: 0.20,
            cap: 0.95,
            emergency: 0.40,
        }
    }
}

impl ConfidenceWeights {
    pub fn score(&self, from_model: bool, live_snapshots: &[bool], refined: bool) -> f64 {
        let mut score = self.base;
        if from_model {
            score += self.primary_model;
        }
        score += live_snapshots
            .iter()
            .zip(&self.snapshots)
            .filter(|(live, _)| **live)
            .map(|(_, weight)| weight)
            .sum::<f64>();
        if refined {
            score += self.refinement;
        }
        score.clamp(0.0, self.cap)
    }
}

// ============================================================================
// Aggregator
// ============================================================================

pub const PRIMARY_MODEL_SOURCE: &str = "primary_model";
pub const REFINEMENT_SOURCE: &str = "refinement";

pub struct ForecastAggregator {
    primary: Arc<dyn PrimaryForecaster>,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    refiner: Option<ForecastRefiner>,
    classifier: AlertClassifier,
    cache: ForecastCache,
    weights: ConfidenceWeights,
}

impl ForecastAggregator {
    pub fn new(
        primary: Arc<dyn PrimaryForecaster>,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        refiner: Option<ForecastRefiner>,
        classifier: AlertClassifier,
        cache: ForecastCache,
        weights: ConfidenceWeights,
    ) -> Self {
        Self {
            primary,
            adapters,
            refiner,
            classifier,
            cache,
            weights,
        }
    }

    pub fn classifier(&self) -> &AlertClassifier {
        &self.classifier
    }

    /// Cached result for today when fresh, a new run otherwise
    pub async fn generate(&self, period: ForecastPeriod) -> AppResult<HybridForecastResult> {
        let today = local_date(Utc::now());
        if let Some(cached) = self.cache.get(period, today).await {
            tracing::debug!(%period, "Serving cached forecast");
            return Ok(cached);
        }
        self.run_and_store(period, today).await
    }

    /// New run regardless of the cache
    pub async fn refresh(&self, period: ForecastPeriod) -> AppResult<HybridForecastResult> {
        let today = local_date(Utc::now());
        self.run_and_store(period, today).await
    }

    async fn run_and_store(&self, period: ForecastPeriod, today: NaiveDate) -> AppResult<HybridForecastResult> {
        let result = self.generate_for_date(period, today).await?;
        self.cache.insert(today, result.clone()).await;
        Ok(result)
    }

    /// Current snapshot from every adapter, in adapter order
    pub async fn current_snapshots(&self) -> Vec<SourceSnapshot> {
        join_all(self.adapters.iter().map(|adapter| adapter.fetch_current_conditions())).await
    }

    /// One uncached pipeline run for a forecast generated on `today`
    pub async fn generate_for_date(
        &self,
        period: ForecastPeriod,
        today: NaiveDate,
    ) -> AppResult<HybridForecastResult> {
        let dates = period.horizon_dates(today)?;
        let mut run = PipelineRun::new(period);

        run.advance(PipelineState::FetchingPrimary)?;
        run.advance(PipelineState::FetchingSnapshots)?;
        let (primary, snapshots) = tokio::join!(
            self.primary.generate(period, today),
            self.current_snapshots()
        );
        let live: Vec<bool> = snapshots.iter().map(SourceSnapshot::is_live).collect();

        let primary = match primary {
            Ok(primary) => primary,
            Err(e) => {
                tracing::error!(%period, error = %e, "Primary forecast failed, using emergency fallback");
                run.advance(PipelineState::EmergencyFallback)?;
                return Ok(self.emergency_result(period, &dates, &snapshots));
            }
        };

        let refined = match &self.refiner {
            Some(refiner) => {
                run.advance(PipelineState::Refining)?;
                match refiner.refine(&primary.points, period, &snapshots, &dates).await {
                    Ok(refined) => Some(refined),
                    Err(e) => {
                        tracing::warn!(%period, error = %e, "Refinement failed, keeping primary forecast");
                        None
                    }
                }
            }
            None => None,
        };

        run.advance(PipelineState::Finalizing)?;
        let refined_ok = refined.is_some();
        let (forecast, alerts) = match refined {
            Some(RefinedForecast { forecast, alerts }) => {
                let forecast = finalize_series(&dates, &forecast, self.weights.emergency);
                let alerts = reanchor_alerts(alerts, &forecast, &self.classifier);
                (forecast, alerts)
            }
            None => (finalize_series(&dates, &primary.points, self.weights.emergency), Vec::new()),
        };
        let alerts = if alerts.is_empty() {
            self.classifier.classify(&forecast)
        } else {
            alerts
        };

        let mut sources = source_map(&snapshots);
        sources.insert(PRIMARY_MODEL_SOURCE.to_string(), primary.from_model);
        sources.insert(REFINEMENT_SOURCE.to_string(), refined_ok);

        let confidence = self.weights.score(primary.from_model, &live, refined_ok);
        run.advance(PipelineState::Done)?;
        tracing::info!(
            %period,
            points = forecast.len(),
            alerts = alerts.len(),
            confidence,
            refined = refined_ok,
            "Forecast generated"
        );

        Ok(HybridForecastResult {
            period,
            generated_at: Utc::now(),
            forecast,
            alerts,
            sources,
            confidence,
            outcome: PipelineOutcome::Complete,
        })
    }

    fn emergency_result(
        &self,
        period: ForecastPeriod,
        dates: &[NaiveDate],
        snapshots: &[SourceSnapshot],
    ) -> HybridForecastResult {
        let forecast = seasonal_series(dates, self.weights.emergency);
        let alerts = self.classifier.classify(&forecast);

        let mut sources = source_map(snapshots);
        sources.insert(PRIMARY_MODEL_SOURCE.to_string(), false);
        sources.insert(REFINEMENT_SOURCE.to_string(), false);

        HybridForecastResult {
            period,
            generated_at: Utc::now(),
            forecast,
            alerts,
            sources,
            confidence: self.weights.emergency,
            outcome: PipelineOutcome::EmergencyFallback,
        }
    }
}

fn source_map(snapshots: &[SourceSnapshot]) -> BTreeMap<String, bool> {
    snapshots
        .iter()
        .map(|s| (s.source.as_str().to_string(), s.is_live()))
        .collect()
}

/// Series taken straight from the seasonal table
pub fn seasonal_series(dates: &[NaiveDate], confidence: f64) -> Vec<TimeSeriesPoint> {
    dates.iter().map(|date| seasonal_point(*date, confidence)).collect()
}

fn seasonal_point(date: NaiveDate, confidence: f64) -> TimeSeriesPoint {
    let baseline = seasonal::baseline(date.month0());
    let mut point = TimeSeriesPoint::new(date, baseline.precipitation_mm)
        .with_source(PointSource::Fallback)
        .with_confidence(confidence);
    point.temperature = Some(baseline.temperature_c);
    point.pressure = Some(seasonal::station_pressure_hpa());
    point
}

/// Rebuild the series on `dates`, carrying values over by position.
///
/// The input's own dates are ignored. A short input repeats its last point;
/// an empty one falls back to the seasonal table.
pub fn finalize_series(dates: &[NaiveDate], values: &[TimeSeriesPoint], fallback_confidence: f64) -> Vec<TimeSeriesPoint> {
    dates
        .iter()
        .enumerate()
        .map(|(index, date)| {
            let mut point = match values.get(index).or_else(|| values.last()) {
                Some(source) => TimeSeriesPoint {
                    date: *date,
                    ..source.clone()
                },
                None => seasonal_point(*date, fallback_confidence),
            };
            sanitize_point(&mut point);
            point
        })
        .collect()
}

/// Re-anchor untrusted alerts on the finalized series.
///
/// An alert survives only if its date is in `forecast`, the classifier flags
/// that point, and no earlier alert claimed the same date. Severity, grade
/// and precipitation always come from the classifier; the model's wording is
/// kept only when its severity agrees.
pub fn reanchor_alerts(alerts: Vec<Alert>, forecast: &[TimeSeriesPoint], classifier: &AlertClassifier) -> Vec<Alert> {
    let mut claimed = HashSet::new();
    alerts
        .into_iter()
        .filter_map(|alert| {
            let index = forecast.iter().position(|p| p.date == alert.date)?;
            let classified = classifier.alert_at(forecast, index)?;
            if !claimed.insert(alert.date) {
                return None;
            }
            if classified.severity != alert.severity {
                return Some(classified);
            }
            Some(Alert {
                id: Uuid::new_v4(),
                title: alert.title,
                message: alert.message.or(classified.message),
                ..classified
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared::AlertSeverity;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_transitions() {
        let mut run = PipelineRun::new(ForecastPeriod::Daily);
        run.advance(PipelineState::FetchingPrimary).unwrap();
        run.advance(PipelineState::FetchingSnapshots).unwrap();
        assert!(run.advance(PipelineState::Done).is_err());
        run.advance(PipelineState::Finalizing).unwrap();
        run.advance(PipelineState::Done).unwrap();
        assert!(run.advance(PipelineState::EmergencyFallback).is_err());
        assert_eq!(run.history().len(), 5);
    }

    #[test]
    fn test_emergency_fallback_from_any_live_state() {
        for state in [
            PipelineState::Idle,
            PipelineState::FetchingPrimary,
            PipelineState::FetchingSnapshots,
            PipelineState::Refining,
            PipelineState::Finalizing,
        ] {
            assert!(state.can_transition_to(PipelineState::EmergencyFallback));
        }
    }

    #[test]
    fn test_confidence_weights() {
        let weights = ConfidenceWeights::default();
        assert!((weights.score(false, &[false, false, false], false) - 0.30).abs() < 1e-9);
        assert!((weights.score(true, &[false, false, false], false) - 0.75).abs() < 1e-9);
        assert!((weights.score(false, &[true, false, true], false) - 0.62).abs() < 1e-9);
        assert!((weights.score(true, &[true, true, true], true) - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_emergency_ranks_below_any_single_source() {
        let weights = ConfidenceWeights::default();
        for slot in 0..weights.snapshots.len() {
            let mut live = vec![false; weights.snapshots.len()];
            live[slot] = true;
            assert!(weights.emergency < weights.score(false, &live, false));
        }
        assert!(weights.emergency < weights.score(true, &[], false));
        assert!(weights.emergency < weights.score(false, &[], true));
    }

    #[test]
    fn test_finalize_repeats_last_point_when_short() {
        let dates = ForecastPeriod::Daily.horizon_dates(date(2024, 4, 20)).unwrap();
        let values = vec![
            TimeSeriesPoint::new(date(2030, 1, 1), 4.0),
            TimeSeriesPoint::new(date(2030, 1, 9), -2.0),
        ];
        let series = finalize_series(&dates, &values, 0.4);

        assert_eq!(series.len(), 7);
        assert_eq!(series[0].date, date(2024, 4, 21));
        assert_eq!(series[0].precipitation, 4.0);
        assert!(series[1..].iter().all(|p| p.precipitation == 0.0));
        shared::validate_series(&series, ForecastPeriod::Daily, date(2024, 4, 20)).unwrap();
    }

    #[test]
    fn test_finalize_empty_uses_seasonal_table() {
        let dates = ForecastPeriod::Yearly.horizon_dates(date(2024, 4, 20)).unwrap();
        let series = finalize_series(&dates, &[], 0.4);
        assert_eq!(series.len(), 12);
        assert!(series.iter().all(|p| p.source == Some(PointSource::Fallback)));
        assert_eq!(series[0].precipitation, seasonal::baseline(4).precipitation_mm);
    }

    #[test]
    fn test_reanchor_drops_foreign_dates_and_copies_precipitation() {
        let forecast = vec![TimeSeriesPoint::new(date(2024, 4, 21), 25.0)];
        let inside = Alert::new(date(2024, 4, 21), 99.0, AlertSeverity::Warning, "Rain");
        let outside = Alert::new(date(2024, 5, 30), 40.0, AlertSeverity::Critical, "Storm");
        let original_id = inside.id;

        let alerts = reanchor_alerts(vec![inside, outside], &forecast, &AlertClassifier::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].precipitation, 25.0);
        assert_eq!(alerts[0].title, "Rain");
        assert_ne!(alerts[0].id, original_id);
    }

    #[test]
    fn test_reanchor_overrides_model_severity() {
        let forecast = vec![
            TimeSeriesPoint::new(date(2024, 4, 21), 2.0),
            TimeSeriesPoint::new(date(2024, 4, 22), 30.0),
            TimeSeriesPoint::new(date(2024, 4, 23), 40.0),
        ];
        let alerts = vec![
            Alert::new(date(2024, 4, 21), 2.0, AlertSeverity::Critical, "Storm"),
            Alert::new(date(2024, 4, 22), 30.0, AlertSeverity::Normal, "Calm"),
            Alert::new(date(2024, 4, 23), 40.0, AlertSeverity::Critical, "Flood"),
            Alert::new(date(2024, 4, 23), 40.0, AlertSeverity::Warning, "Flood again"),
        ];

        let alerts = reanchor_alerts(alerts, &forecast, &AlertClassifier::default());
        let kept: Vec<(NaiveDate, AlertSeverity)> = alerts.iter().map(|a| (a.date, a.severity)).collect();
        assert_eq!(
            kept,
            vec![
                (date(2024, 4, 22), AlertSeverity::Warning),
                (date(2024, 4, 23), AlertSeverity::Critical),
            ]
        );
        assert_ne!(alerts[0].title, "Calm");
        assert_eq!(alerts[1].title, "Flood");
    }

    proptest! {
        #[test]
        fn prop_confidence_bounded_and_monotonic(
            from_model in any::<bool>(),
            live in proptest::collection::vec(any::<bool>(), 0..5),
            refined in any::<bool>(),
            extra in 0usize..5,
        ) {
            let weights = ConfidenceWeights::default();
            let score = weights.score(from_model, &live, refined);
            prop_assert!((0.0..=0.95).contains(&score));

            // one more live source never lowers the score
            let mut more = live.clone();
            if let Some(slot) = more.get_mut(extra) {
                *slot = true;
            }
            prop_assert!(weights.score(from_model, &more, refined) >= score);
            prop_assert!(weights.score(true, &live, refined) >= score);
            prop_assert!(weights.score(from_model, &live, true) >= score);
        }
    }
}
