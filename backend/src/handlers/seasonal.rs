//! HTTP handlers for the seasonal reference table

use axum::Json;
use shared::seasonal::{self, SeasonalBaseline};

pub async fn get_seasonal_table() -> Json<Vec<SeasonalBaseline>> {
    Json(seasonal::table())
}
