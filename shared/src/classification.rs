//! Alert classification over a finished forecast series
//!
//! Pure functions: the same series always yields the same severities.
//! Severity is monotonic in precipitation within a contextual bucket.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{Alert, AlertGrade, AlertSeverity, TimeSeriesPoint};
use crate::seasonal;
use crate::types::PAPALLACTA;

/// Precipitation cut points (mm per point)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AlertThresholds {
    pub warning_mm: f64,
    pub critical_mm: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            warning_mm: 20.0,
            critical_mm: 36.0,
        }
    }
}

impl AlertThresholds {
    /// Split point between low and medium warnings
    pub fn warning_midpoint(&self) -> f64 {
        (self.warning_mm + self.critical_mm) / 2.0
    }
}

/// Context rules applied by the extended classifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ContextRules {
    /// Rain at or above this in a dry month is anomalous
    pub dry_anomaly_mm: f64,
    /// Daily rain at or above this counts towards a soak run
    pub soak_mm: f64,
    /// Consecutive soak days needed to escalate
    pub soak_run: usize,
}

impl Default for ContextRules {
    fn default() -> Self {
        Self {
            dry_anomaly_mm: 10.0,
            soak_mm: 15.0,
            soak_run: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierMode {
    /// Three tiers, thresholds only
    #[default]
    Standard,
    /// Adds grades and the dry-month and soak rules
    Extended,
}

/// Severity for a single value under the plain thresholds
pub fn classify_precipitation(precipitation: f64, thresholds: &AlertThresholds) -> AlertSeverity {
    if precipitation >= thresholds.critical_mm {
        AlertSeverity::Critical
    } else if precipitation >= thresholds.warning_mm {
        AlertSeverity::Warning
    } else {
        AlertSeverity::Normal
    }
}

/// Why an extended-mode point was escalated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escalation {
    DryMonthAnomaly,
    Soak,
}

#[derive(Debug, Clone, Default)]
pub struct AlertClassifier {
    pub thresholds: AlertThresholds,
    pub rules: ContextRules,
    pub mode: ClassifierMode,
}

impl AlertClassifier {
    pub fn new(thresholds: AlertThresholds, mode: ClassifierMode) -> Self {
        Self {
            thresholds,
            rules: ContextRules::default(),
            mode,
        }
    }

    pub fn extended() -> Self {
        Self::new(AlertThresholds::default(), ClassifierMode::Extended)
    }

    /// Severity of every point, in series order
    pub fn severities(&self, series: &[TimeSeriesPoint]) -> Vec<AlertSeverity> {
        (0..series.len())
            .map(|index| self.assess(series, index).0)
            .collect()
    }

    /// One alert per point above normal
    pub fn classify(&self, series: &[TimeSeriesPoint]) -> Vec<Alert> {
        (0..series.len())
            .filter_map(|index| self.alert_at(series, index))
            .collect()
    }

    /// Alert for the point at `index`, in the context of the whole series.
    /// `None` when the point is normal or out of range.
    pub fn alert_at(&self, series: &[TimeSeriesPoint], index: usize) -> Option<Alert> {
        let point = series.get(index)?;
        let (severity, escalation) = self.assess(series, index);
        if severity == AlertSeverity::Normal {
            return None;
        }
        Some(self.build_alert(point, severity, escalation))
    }

    fn assess(&self, series: &[TimeSeriesPoint], index: usize) -> (AlertSeverity, Option<Escalation>) {
        let point = &series[index];
        let severity = classify_precipitation(point.precipitation, &self.thresholds);
        if self.mode == ClassifierMode::Standard || severity != AlertSeverity::Normal {
            return (severity, None);
        }

        if seasonal::is_dry_month(point.date.month0()) && point.precipitation >= self.rules.dry_anomaly_mm {
            return (AlertSeverity::Warning, Some(Escalation::DryMonthAnomaly));
        }
        if self.closes_soak_run(series, index) {
            return (AlertSeverity::Warning, Some(Escalation::Soak));
        }
        (AlertSeverity::Normal, None)
    }

    fn closes_soak_run(&self, series: &[TimeSeriesPoint], index: usize) -> bool {
        let run = self.rules.soak_run.max(1);
        if index + 1 < run {
            return false;
        }
        let window = &series[index + 1 - run..=index];
        let consecutive_days = window
            .windows(2)
            .all(|pair| pair[1].date.signed_duration_since(pair[0].date).num_days() == 1);
        consecutive_days && window.iter().all(|p| p.precipitation >= self.rules.soak_mm)
    }

    fn grade(&self, precipitation: f64, severity: AlertSeverity) -> AlertGrade {
        match severity {
            AlertSeverity::Critical => AlertGrade::High,
            _ if precipitation >= self.thresholds.warning_midpoint() => AlertGrade::Medium,
            _ => AlertGrade::Low,
        }
    }

    fn build_alert(
        &self,
        point: &TimeSeriesPoint,
        severity: AlertSeverity,
        escalation: Option<Escalation>,
    ) -> Alert {
        let (title, message) = describe(point.date, point.precipitation, severity, escalation);
        let alert = Alert::new(point.date, point.precipitation, severity, title).with_message(message);
        match self.mode {
            ClassifierMode::Standard => alert,
            ClassifierMode::Extended => alert.with_grade(self.grade(point.precipitation, severity)),
        }
    }
}

fn describe(
    date: NaiveDate,
    precipitation: f64,
    severity: AlertSeverity,
    escalation: Option<Escalation>,
) -> (&'static str, String) {
    let day = date.format("%Y-%m-%d");
    match (severity, escalation) {
        (_, Some(Escalation::DryMonthAnomaly)) => (
            "Anomalous rain in dry season",
            format!(
                "{precipitation:.1} mm expected on {day}, well above the dry-season norm at {}",
                PAPALLACTA.name
            ),
        ),
        (_, Some(Escalation::Soak)) => (
            "Sustained rainfall",
            format!("Several consecutive wet days ending {day} ({precipitation:.1} mm); soil saturation likely"),
        ),
        (AlertSeverity::Critical, None) => (
            "Critical precipitation",
            format!(
                "{precipitation:.1} mm expected on {day}; high turbidity risk at the {} intake",
                PAPALLACTA.name
            ),
        ),
        _ => (
            "Heavy precipitation",
            format!("{precipitation:.1} mm expected on {day}; monitor intake turbidity"),
        ),
    }
}
