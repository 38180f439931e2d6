//! Seasonal reference table for the Papallacta catchment
//!
//! Long-run climatological averages per calendar month. Used as the prior
//! for simulated snapshots and series, and as the last-resort fallback when
//! nothing else is available.

use std::f64::consts::PI;

use serde::Serialize;

use crate::types::PAPALLACTA;

/// Mean daily precipitation (mm) per month, January first.
/// Wet seasons peak in April and October.
const MONTHLY_PRECIPITATION_MM: [f64; 12] = [4.2, 5.1, 6.8, 8.9, 7.2, 5.8, 4.1, 4.5, 6.2, 7.8, 6.4, 4.9];

/// Mean air temperature (°C) per month at 3220 m.
const MONTHLY_TEMPERATURE_C: [f64; 12] = [10.1, 10.2, 10.4, 10.5, 10.3, 9.6, 9.1, 9.2, 9.6, 10.1, 10.3, 10.2];

/// Amplitude of the day-of-year precipitation modulation (mm)
pub const SEASONAL_AMPLITUDE_MM: f64 = 1.5;

/// Months at or below this mean are considered climatologically dry
pub const DRY_MONTH_BASELINE_MM: f64 = 5.0;

/// Baseline for one month
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalBaseline {
    /// Zero-based month index
    pub month: u32,
    pub precipitation_mm: f64,
    pub temperature_c: f64,
}

/// Baseline for a zero-based month index; indices wrap modulo 12.
pub fn baseline(month0: u32) -> SeasonalBaseline {
    let month = month0 % 12;
    SeasonalBaseline {
        month,
        precipitation_mm: MONTHLY_PRECIPITATION_MM[month as usize],
        temperature_c: MONTHLY_TEMPERATURE_C[month as usize],
    }
}

/// The whole table, January first
pub fn table() -> Vec<SeasonalBaseline> {
    (0..12).map(baseline).collect()
}

/// Sinusoidal precipitation adjustment for a 1-based day of the year
pub fn seasonal_adjustment(day_of_year: u32) -> f64 {
    SEASONAL_AMPLITUDE_MM * (2.0 * PI * f64::from(day_of_year) / 365.25).sin()
}

pub fn is_dry_month(month0: u32) -> bool {
    baseline(month0).precipitation_mm <= DRY_MONTH_BASELINE_MM
}

/// Standard-atmosphere pressure (hPa) at the station elevation
pub fn station_pressure_hpa() -> f64 {
    1013.25 * (1.0 - (0.0065 * PAPALLACTA.elevation_m) / 288.15).powf(5.255)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_wraps_month_index() {
        assert_eq!(baseline(0), baseline(12));
        assert_eq!(baseline(3).precipitation_mm, 8.9);
    }

    #[test]
    fn test_table_is_complete() {
        let table = table();
        assert_eq!(table.len(), 12);
        assert!(table.iter().all(|b| b.precipitation_mm > 0.0));
    }

    #[test]
    fn test_dry_months() {
        assert!(is_dry_month(6)); // July
        assert!(!is_dry_month(3)); // April
    }

    #[test]
    fn test_station_pressure() {
        let pressure = station_pressure_hpa();
        assert!(pressure > 670.0 && pressure < 690.0, "got {pressure}");
    }

    #[test]
    fn test_seasonal_adjustment_bounded() {
        for day in 1..=366 {
            assert!(seasonal_adjustment(day).abs() <= SEASONAL_AMPLITUDE_MM);
        }
    }
}
