//! Numeric policies and series validation
//!
//! Every value leaving the pipeline passes through these clamps, whatever
//! upstream produced it.

use chrono::NaiveDate;

use crate::error::ForecastError;
use crate::models::TimeSeriesPoint;
use crate::types::ForecastPeriod;

// ============================================================================
// Numeric policies
// ============================================================================

/// Upper bound for a single point (mm). Above any recorded daily total for
/// the catchment; guards against runaway model output.
pub const MAX_PRECIPITATION_MM: f64 = 200.0;

/// Clamp precipitation to [0, MAX_PRECIPITATION_MM]. Non-finite values become 0.
pub fn clamp_precipitation(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, MAX_PRECIPITATION_MM)
}

/// Clamp a probability-like score to [0, 1]
pub fn clamp_unit(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Clamp a percentage to [0, 100]
pub fn clamp_percent(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Confidence decaying with lookahead: `max(floor, base - index * decay)`
pub fn lookahead_confidence(base: f64, decay: f64, floor: f64, index: usize) -> f64 {
    clamp_unit((base - index as f64 * decay).max(floor))
}

/// Apply every clamp to a point in place
pub fn sanitize_point(point: &mut TimeSeriesPoint) {
    point.precipitation = clamp_precipitation(point.precipitation);
    point.humidity = point.humidity.map(clamp_percent);
    point.water_quality = point.water_quality.map(clamp_percent);
    point.confidence = point.confidence.map(clamp_unit);
    point.flow_rate = point.flow_rate.map(|v| if v.is_finite() { v.max(0.0) } else { 0.0 });
    point.wind_speed = point.wind_speed.map(|v| if v.is_finite() { v.max(0.0) } else { 0.0 });
    point.temperature = point.temperature.filter(|v| v.is_finite());
    point.pressure = point.pressure.filter(|v| v.is_finite() && *v > 0.0);
}

// ============================================================================
// Series validation
// ============================================================================

/// Check that `series` is exactly the horizon of `period` generated on
/// `generated_on`: right length, consecutive dates, finite values.
pub fn validate_series(
    series: &[TimeSeriesPoint],
    period: ForecastPeriod,
    generated_on: NaiveDate,
) -> Result<(), ForecastError> {
    if series.is_empty() {
        return Err(ForecastError::EmptySeries);
    }
    let expected = period.horizon_dates(generated_on)?;
    if series.len() != expected.len() {
        return Err(ForecastError::NonContiguous {
            index: series.len().min(expected.len()),
        });
    }
    for (index, (point, date)) in series.iter().zip(&expected).enumerate() {
        if point.date != *date {
            return Err(ForecastError::NonContiguous { index });
        }
        if !point.precipitation.is_finite() {
            return Err(ForecastError::NonFiniteValue { index });
        }
    }
    Ok(())
}

/// Check and clamp a caller-supplied series before classification.
///
/// Rejects empty series and dates that do not strictly increase, then
/// applies [`sanitize_point`] to every point.
pub fn prepare_series(series: &mut [TimeSeriesPoint]) -> Result<(), ForecastError> {
    if series.is_empty() {
        return Err(ForecastError::EmptySeries);
    }
    if let Some(index) = series.windows(2).position(|pair| pair[0].date >= pair[1].date) {
        return Err(ForecastError::Unordered { index: index + 1 });
    }
    series.iter_mut().for_each(sanitize_point);
    Ok(())
}
