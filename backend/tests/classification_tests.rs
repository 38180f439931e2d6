//! Alert classification integration tests
//!
//! Tests for alert severity including:
//! - Daily threshold scenario
//! - Severity monotonicity in precipitation
//! - Idempotent classification
//! - Extended mode context rules

use chrono::NaiveDate;
use proptest::prelude::*;
use shared::{
    classify_precipitation, AlertClassifier, AlertGrade, AlertSeverity, AlertThresholds, ClassifierMode,
    TimeSeriesPoint,
};

fn series(start: NaiveDate, values: &[f64]) -> Vec<TimeSeriesPoint> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| TimeSeriesPoint::new(start + chrono::Duration::days(i as i64), *v))
        .collect()
}

fn april() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 21).unwrap()
}

fn july() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 10).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// The canonical daily scenario
    #[test]
    fn test_daily_scenario() {
        let points = series(april(), &[5.0, 10.0, 22.0, 38.0, 8.0, 0.0, 30.0]);
        let severities = AlertClassifier::default().severities(&points);

        use AlertSeverity::*;
        assert_eq!(severities, vec![Normal, Normal, Warning, Critical, Normal, Normal, Warning]);
    }

    /// Alerts copy date and precipitation from their point
    #[test]
    fn test_alerts_reference_their_points() {
        let points = series(april(), &[22.0, 1.0, 40.0]);
        let alerts = AlertClassifier::default().classify(&points);

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].date, points[0].date);
        assert_eq!(alerts[0].precipitation, 22.0);
        assert_eq!(alerts[1].severity, AlertSeverity::Critical);
        assert!(alerts.iter().all(|a| a.grade.is_none()));
        assert_ne!(alerts[0].id, alerts[1].id);
    }

    /// Extended mode escalates anomalous dry-season rain
    #[test]
    fn test_extended_dry_month_anomaly() {
        let points = series(july(), &[12.0]);
        assert_eq!(AlertClassifier::default().severities(&points), vec![AlertSeverity::Normal]);

        let alerts = AlertClassifier::extended().classify(&points);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);
        assert_eq!(alerts[0].grade, Some(AlertGrade::Low));
    }

    /// Extended mode escalates the point that closes a soak run
    #[test]
    fn test_extended_soak_run() {
        let points = series(april(), &[16.0, 17.0, 18.0, 2.0]);
        let severities = AlertClassifier::extended().severities(&points);

        use AlertSeverity::*;
        assert_eq!(severities, vec![Normal, Normal, Warning, Normal]);
    }

    /// Custom thresholds move the cut points
    #[test]
    fn test_custom_thresholds() {
        let thresholds = AlertThresholds {
            warning_mm: 10.0,
            critical_mm: 15.0,
        };
        assert_eq!(classify_precipitation(12.0, &thresholds), AlertSeverity::Warning);
        assert_eq!(classify_precipitation(15.0, &thresholds), AlertSeverity::Critical);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

fn arb_mode() -> impl Strategy<Value = ClassifierMode> {
    prop_oneof![Just(ClassifierMode::Standard), Just(ClassifierMode::Extended)]
}

proptest! {
    /// More rain never lowers the severity of an isolated point
    #[test]
    fn prop_severity_monotonic(
        a in 0.0f64..200.0,
        b in 0.0f64..200.0,
        month in 1u32..=12,
        mode in arb_mode(),
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let date = NaiveDate::from_ymd_opt(2024, month, 15).unwrap();
        let classifier = AlertClassifier::new(AlertThresholds::default(), mode);

        let low_severity = classifier.severities(&series(date, &[low]))[0];
        let high_severity = classifier.severities(&series(date, &[high]))[0];
        prop_assert!(low_severity <= high_severity);
    }

    /// Re-running the classifier yields the same severities
    #[test]
    fn prop_classification_idempotent(
        values in proptest::collection::vec(0.0f64..80.0, 1..40),
        mode in arb_mode(),
    ) {
        let points = series(april(), &values);
        let classifier = AlertClassifier::new(AlertThresholds::default(), mode);

        let first = classifier.classify(&points);
        let second = classifier.classify(&points);
        prop_assert_eq!(first.len(), second.len());
        for (x, y) in first.iter().zip(&second) {
            prop_assert_eq!(x.date, y.date);
            prop_assert_eq!(x.severity, y.severity);
        }
        prop_assert_eq!(classifier.severities(&points), classifier.severities(&points));
    }

    /// Exactly one alert per non-normal point
    #[test]
    fn prop_alert_count_matches_severities(values in proptest::collection::vec(0.0f64..80.0, 0..40)) {
        let points = series(april(), &values);
        let classifier = AlertClassifier::default();
        let flagged = classifier
            .severities(&points)
            .into_iter()
            .filter(|s| *s != AlertSeverity::Normal)
            .count();
        prop_assert_eq!(classifier.classify(&points).len(), flagged);
    }
}
