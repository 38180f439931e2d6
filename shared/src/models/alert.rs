//! Precipitation alert models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ordered alert severity: normal < warning < critical
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    #[serde(alias = "low", alias = "info")]
    Normal,
    #[serde(alias = "medium", alias = "moderate")]
    Warning,
    #[serde(alias = "high", alias = "severe")]
    Critical,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Normal => write!(f, "normal"),
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Finer grade attached by the extended classifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AlertGrade {
    Low,
    Medium,
    High,
}

/// A derived flag on one series point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub date: NaiveDate,
    /// Precipitation of the originating point, copied for display
    pub precipitation: f64,
    pub severity: AlertSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<AlertGrade>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Alert {
    pub fn new(date: NaiveDate, precipitation: f64, severity: AlertSeverity, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            precipitation,
            severity,
            grade: None,
            title: title.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_grade(mut self, grade: AlertGrade) -> Self {
        self.grade = Some(grade);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Normal < AlertSeverity::Warning);
        assert!(AlertSeverity::Warning < AlertSeverity::Critical);
    }

    #[test]
    fn test_severity_aliases() {
        let high: AlertSeverity = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(high, AlertSeverity::Critical);
        let medium: AlertSeverity = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(medium, AlertSeverity::Warning);
        assert!(serde_json::from_str::<AlertSeverity>("\"extreme\"").is_err());
    }
}
