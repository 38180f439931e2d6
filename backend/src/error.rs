//! Error handling for the Papallacta forecast service
//!
//! Provides consistent error responses in English and Spanish

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::ForecastError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_es: String,
    },

    // Upstream errors, recovered inside the pipeline
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Generative model error: {0}")]
    GenerativeModel(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Timed out after {0:?} waiting for {1}")]
    Timeout(std::time::Duration, &'static str),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_es: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    /// Shorthand for a single-field validation failure
    pub fn invalid(field: &str, message: impl Into<String>, message_es: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
            message_es: message_es.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation {
                field,
                message,
                message_es,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_es: message_es.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::UpstreamUnavailable(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "UPSTREAM_UNAVAILABLE".to_string(),
                    message_en: format!("Upstream service unavailable: {}", msg),
                    message_es: format!("Servicio externo no disponible: {}", msg),
                    field: None,
                },
            ),
            AppError::GenerativeModel(msg) | AppError::MalformedResponse(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "GENERATIVE_MODEL_ERROR".to_string(),
                    message_en: format!("Forecast refinement failed: {}", msg),
                    message_es: format!("Falló el refinamiento del pronóstico: {}", msg),
                    field: None,
                },
            ),
            AppError::Timeout(after, what) => (
                StatusCode::GATEWAY_TIMEOUT,
                ErrorDetail {
                    code: "UPSTREAM_TIMEOUT".to_string(),
                    message_en: format!("{} did not respond within {:?}", what, after),
                    message_es: format!("{} no respondió en {:?}", what, after),
                    field: None,
                },
            ),
            AppError::Forecast(ForecastError::UnknownPeriod(period)) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_PERIOD".to_string(),
                    message_en: format!(
                        "Unknown period '{}'. Use daily, monthly or yearly",
                        period
                    ),
                    message_es: format!(
                        "Período '{}' no válido. Use daily, monthly o yearly",
                        period
                    ),
                    field: Some("period".to_string()),
                },
            ),
            AppError::Forecast(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_SERIES".to_string(),
                    message_en: err.to_string(),
                    message_es: format!("Serie no válida: {}", err),
                    field: Some("series".to_string()),
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message_en: format!("Configuration error: {}", msg),
                    message_es: format!("Error de configuración: {}", msg),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_es: "Error interno del servidor".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_es: "Error interno del servidor".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;
