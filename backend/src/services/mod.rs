//! Forecast pipeline services for the Papallacta forecast service

pub mod aggregator;
pub mod cache;
pub mod noise;
pub mod primary;
pub mod refinement;
pub mod sources;

pub use aggregator::{ConfidenceWeights, ForecastAggregator, PipelineRun, PipelineState};
pub use cache::ForecastCache;
pub use noise::NoiseSource;
pub use primary::{PrimaryForecast, PrimaryForecastGenerator, PrimaryForecaster};
pub use refinement::{ForecastRefiner, RefinedForecast};
pub use sources::{OperationalAdapter, RegulatoryAdapter, SourceAdapter, WeatherAdapter};
