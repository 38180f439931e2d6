//! Configuration management for the Papallacta forecast service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with PAPALLACTA_ prefix

use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::{AlertThresholds, ClassifierMode};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Trained prediction model endpoint
    #[serde(default)]
    pub prediction: PredictionConfig,

    /// Generative refinement model
    pub generative: GenerativeConfig,

    /// Current-conditions source endpoints
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Aggregation pipeline tuning
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PredictionConfig {
    /// Base URL of the prediction backend, e.g. http://127.0.0.1:5000
    pub endpoint: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerativeConfig {
    /// API base URL
    pub endpoint: String,

    /// API key; refinement is disabled when absent
    pub api_key: Option<String>,

    /// Model name
    pub model: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourcesConfig {
    /// Meteorological station network
    pub weather_endpoint: Option<String>,

    /// Utility SCADA telemetry
    pub operational_endpoint: Option<String>,

    /// Government water/risk agency feed
    pub regulatory_endpoint: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Bound on every upstream call, in seconds
    pub upstream_timeout_secs: u64,

    /// Bound on the refinement call, in seconds
    pub refinement_timeout_secs: u64,

    /// How long a cached result is served, in seconds
    pub cache_ttl_secs: u64,

    /// Fixed seed for reproducible simulated values
    pub noise_seed: Option<u64>,

    /// Alert classifier variant
    pub classifier_mode: ClassifierMode,

    /// Alert cut points
    pub thresholds: AlertThresholds,
}

impl PipelineConfig {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn refinement_timeout(&self) -> Duration {
        Duration::from_secs(self.refinement_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            upstream_timeout_secs: 8,
            refinement_timeout_secs: 30,
            cache_ttl_secs: 600,
            noise_seed: None,
            classifier_mode: ClassifierMode::Standard,
            thresholds: AlertThresholds::default(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("PAPALLACTA_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default(
                "generative.endpoint",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("generative.model", "gemini-1.5-flash")?
            .set_default("pipeline.upstream_timeout_secs", 8)?
            .set_default("pipeline.refinement_timeout_secs", 30)?
            .set_default("pipeline.cache_ttl_secs", 600)?
            .set_default("pipeline.classifier_mode", "standard")?
            .set_default("pipeline.thresholds.warning_mm", 20.0)?
            .set_default("pipeline.thresholds.critical_mm", 36.0)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PAPALLACTA_ prefix)
            .add_source(
                Environment::with_prefix("PAPALLACTA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Socket address string to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
