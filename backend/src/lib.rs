//! Papallacta Forecast Service - Backend
//!
//! Merges the trained prediction model, current-conditions sources and an
//! optional generative refinement into one gap-free precipitation forecast
//! for the Papallacta intake of the Quito supply line, with severity alerts.

use std::sync::Arc;

use axum::{routing::get, Router};
use shared::AlertClassifier;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::Config;

use crate::error::AppResult;
use crate::external::{
    ForecastModel, GeminiClient, OperationalClient, PredictionClient, RegulatoryClient, WeatherClient,
};
use crate::services::{
    ConfidenceWeights, ForecastAggregator, ForecastCache, ForecastRefiner, NoiseSource, OperationalAdapter,
    PrimaryForecastGenerator, RegulatoryAdapter, SourceAdapter, WeatherAdapter,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<ForecastAggregator>,
    /// Kept apart from the aggregator for health reporting
    pub prediction: Option<Arc<dyn ForecastModel>>,
    pub config: Arc<Config>,
}

/// Wire every pipeline component from configuration
pub fn build_state(config: Config) -> AppResult<AppState> {
    let pipeline = &config.pipeline;
    let timeout = pipeline.upstream_timeout();
    let noise = Arc::new(NoiseSource::from_config(pipeline.noise_seed));

    let prediction: Option<Arc<dyn ForecastModel>> = match &config.prediction.endpoint {
        Some(url) => Some(Arc::new(PredictionClient::new(url.clone(), timeout)?)),
        None => {
            tracing::info!("No prediction endpoint configured, primary forecast will be simulated");
            None
        }
    };

    let sources = &config.sources;
    let weather = sources
        .weather_endpoint
        .clone()
        .map(|url| WeatherClient::new(url, timeout))
        .transpose()?;
    let operational = sources
        .operational_endpoint
        .clone()
        .map(|url| OperationalClient::new(url, timeout))
        .transpose()?;
    let regulatory = sources
        .regulatory_endpoint
        .clone()
        .map(|url| RegulatoryClient::new(url, timeout))
        .transpose()?;

    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(WeatherAdapter::new(weather, noise.clone(), timeout)),
        Arc::new(OperationalAdapter::new(operational, noise.clone(), timeout)),
        Arc::new(RegulatoryAdapter::new(regulatory, noise.clone(), timeout)),
    ];

    let generative = &config.generative;
    let refiner = match generative.api_key.as_deref().filter(|key| !key.is_empty()) {
        Some(key) => {
            let client = GeminiClient::new(
                generative.endpoint.clone(),
                key.to_string(),
                generative.model.clone(),
                pipeline.refinement_timeout(),
            )?;
            Some(ForecastRefiner::new(Arc::new(client), pipeline.refinement_timeout()))
        }
        None => {
            tracing::info!("No generative API key configured, refinement disabled");
            None
        }
    };

    let primary = Arc::new(PrimaryForecastGenerator::new(prediction.clone(), noise, timeout));
    let aggregator = ForecastAggregator::new(
        primary,
        adapters,
        refiner,
        AlertClassifier::new(pipeline.thresholds, pipeline.classifier_mode),
        ForecastCache::new(pipeline.cache_ttl()),
        ConfidenceWeights::default(),
    );

    Ok(AppState {
        aggregator: Arc::new(aggregator),
        prediction,
        config: Arc::new(config),
    })
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Papallacta Forecast Service API v1"
}
