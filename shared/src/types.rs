//! Common types used across the platform

use chrono::{DateTime, Datelike, Days, FixedOffset, Months, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::ForecastError;

/// GPS coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsCoordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A monitored site of the water-supply system
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Station {
    pub name: &'static str,
    pub coordinates: GpsCoordinates,
    pub elevation_m: f64,
}

/// Papallacta catchment, the intake of the Quito supply line
pub const PAPALLACTA: Station = Station {
    name: "Papallacta",
    coordinates: GpsCoordinates::new(-0.3667, -78.1500),
    elevation_m: 3220.0,
};

/// Quito distribution end of the supply line
pub const QUITO: Station = Station {
    name: "Quito",
    coordinates: GpsCoordinates::new(-0.1807, -78.4678),
    elevation_m: 2850.0,
};

/// Ecuador mainland offset from UTC, in seconds (no daylight saving)
pub const LOCAL_UTC_OFFSET_SECS: i32 = -5 * 3600;

/// Station-local offset
pub fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(LOCAL_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Calendar date at the station for an instant
pub fn local_date(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&local_offset()).date_naive()
}

/// Forecast horizon requested by the dashboard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ForecastPeriod {
    /// Seven daily points
    Daily,
    /// Thirty daily points
    Monthly,
    /// Twelve first-of-month points
    Yearly,
}

impl ForecastPeriod {
    pub const ALL: [ForecastPeriod; 3] = [Self::Daily, Self::Monthly, Self::Yearly];

    /// Number of points a finished series must have
    pub fn horizon(&self) -> usize {
        match self {
            ForecastPeriod::Daily => 7,
            ForecastPeriod::Monthly => 30,
            ForecastPeriod::Yearly => 12,
        }
    }

    /// Largest number of steps the prediction endpoint accepts for this period
    pub fn max_model_steps(&self) -> usize {
        match self {
            ForecastPeriod::Daily => 30,
            ForecastPeriod::Monthly => 60,
            ForecastPeriod::Yearly => 12,
        }
    }

    /// Whether points are first-of-month markers rather than calendar days
    pub fn is_month_based(&self) -> bool {
        matches!(self, ForecastPeriod::Yearly)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastPeriod::Daily => "daily",
            ForecastPeriod::Monthly => "monthly",
            ForecastPeriod::Yearly => "yearly",
        }
    }

    /// Consecutive target dates for a forecast generated on `generated_on`.
    ///
    /// Daily-based periods start the day after; month-based periods start on
    /// the first of the following month.
    pub fn horizon_dates(&self, generated_on: NaiveDate) -> Result<Vec<NaiveDate>, ForecastError> {
        let horizon = self.horizon();
        if self.is_month_based() {
            let first_of_month = generated_on
                .with_day(1)
                .ok_or(ForecastError::DateOutOfRange(generated_on))?;
            (1..=horizon as u32)
                .map(|offset| {
                    first_of_month
                        .checked_add_months(Months::new(offset))
                        .ok_or(ForecastError::DateOutOfRange(generated_on))
                })
                .collect()
        } else {
            (1..=horizon as u64)
                .map(|offset| {
                    generated_on
                        .checked_add_days(Days::new(offset))
                        .ok_or(ForecastError::DateOutOfRange(generated_on))
                })
                .collect()
        }
    }
}

impl std::fmt::Display for ForecastPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ForecastPeriod {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(ForecastPeriod::Daily),
            "monthly" => Ok(ForecastPeriod::Monthly),
            "yearly" => Ok(ForecastPeriod::Yearly),
            other => Err(ForecastError::UnknownPeriod(other.to_string())),
        }
    }
}
