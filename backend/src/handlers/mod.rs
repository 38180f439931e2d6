//! HTTP request handlers

pub mod alerts;
pub mod forecast;
pub mod health;
pub mod seasonal;
pub mod sources;

pub use alerts::classify_series;
pub use forecast::{get_forecast, get_forecast_alerts, refresh_forecast};
pub use health::health_check;
pub use seasonal::get_seasonal_table;
pub use sources::get_sources;
