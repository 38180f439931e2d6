//! WebAssembly module for the Papallacta forecast dashboard
//!
//! Provides client-side computation for:
//! - Alert classification of a displayed series
//! - Seasonal reference values
//! - Horizon date generation for chart axes

use chrono::NaiveDate;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;
use shared::{seasonal, AlertClassifier, AlertThresholds, ClassifierMode};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&"papallacta-wasm ready".into());
}

/// Severity name for a single precipitation value under the default thresholds
#[wasm_bindgen]
pub fn classify_precipitation_value(precipitation_mm: f64) -> String {
    shared::classify_precipitation(precipitation_mm, &AlertThresholds::default()).to_string()
}

/// Classify a JSON series (array of points) and return the alerts as JSON
#[wasm_bindgen]
pub fn classify_series(series_json: &str, extended: bool) -> Result<String, JsValue> {
    classify_series_json(series_json, extended).map_err(|e| JsValue::from_str(&e))
}

/// Rejects empty or unordered series and clamps points before classifying
fn classify_series_json(series_json: &str, extended: bool) -> Result<String, String> {
    let mut series: Vec<TimeSeriesPoint> =
        serde_json::from_str(series_json).map_err(|e| format!("Invalid series JSON: {}", e))?;
    prepare_series(&mut series).map_err(|e| e.to_string())?;

    let mode = if extended {
        ClassifierMode::Extended
    } else {
        ClassifierMode::Standard
    };
    let alerts = AlertClassifier::new(AlertThresholds::default(), mode).classify(&series);

    serde_json::to_string(&alerts).map_err(|e| e.to_string())
}

/// Seasonal baseline precipitation (mm/day) for a zero-based month
#[wasm_bindgen]
pub fn seasonal_precipitation(month0: u32) -> f64 {
    seasonal::baseline(month0).precipitation_mm
}

/// Whole seasonal precipitation table, January first, for chart overlays
#[wasm_bindgen]
pub fn seasonal_precipitation_table() -> js_sys::Float64Array {
    let values: Vec<f64> = seasonal::table().iter().map(|b| b.precipitation_mm).collect();
    js_sys::Float64Array::from(values.as_slice())
}

/// Seasonal baseline temperature (°C) for a zero-based month
#[wasm_bindgen]
pub fn seasonal_temperature(month0: u32) -> f64 {
    seasonal::baseline(month0).temperature_c
}

/// Horizon dates (YYYY-MM-DD, JSON array) for a period generated on `today`
#[wasm_bindgen]
pub fn horizon_dates(period: &str, today: &str) -> Result<String, JsValue> {
    let period: ForecastPeriod = period
        .parse()
        .map_err(|e: shared::ForecastError| JsValue::from_str(&e.to_string()))?;
    let today = NaiveDate::parse_from_str(today, "%Y-%m-%d")
        .map_err(|e| JsValue::from_str(&format!("Invalid date: {}", e)))?;

    let dates = period
        .horizon_dates(today)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&dates).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Clamp a raw precipitation value the same way the backend does
#[wasm_bindgen]
pub fn clamp_precipitation_value(value: f64) -> f64 {
    clamp_precipitation(value)
}
