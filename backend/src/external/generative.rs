//! Generative model client
//!
//! Structured-JSON text generation used by the forecast refinement step.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// A text model that answers with a JSON document
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Submit `prompt` and return the parsed JSON answer, which the model
    /// is asked to shape after `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::GenerativeModel`] if the request fails and
    /// [`AppError::MalformedResponse`] if the answer is not JSON.
    async fn generate_json(&self, prompt: &str, schema: &Value) -> AppResult<Value>;

    /// Model identifier, for logs
    fn model_name(&self) -> &str;
}

/// Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(endpoint: String, api_key: String, model: String, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: super::http_client(timeout)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_json(&self, prompt: &str, schema: &Value) -> AppResult<Value> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
                temperature: 0.2,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::GenerativeModel(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::GenerativeModel(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

        let text = body
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect::<String>();

        parse_json_text(&text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Parse a model answer, tolerating a surrounding Markdown code fence
pub fn parse_json_text(text: &str) -> AppResult<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::MalformedResponse("Empty model answer".to_string()));
    }
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(unfenced)
        .map_err(|e| AppError::MalformedResponse(format!("Model answer is not JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let value = parse_json_text(r#"{"forecast": [], "alerts": []}"#).unwrap();
        assert!(value["forecast"].is_array());
    }

    #[test]
    fn test_parse_fenced_json() {
        let value = parse_json_text("```json\n{\"alerts\": []}\n```").unwrap();
        assert!(value["alerts"].is_array());
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(matches!(
            parse_json_text("Sure! Here is the forecast."),
            Err(AppError::MalformedResponse(_))
        ));
        assert!(matches!(parse_json_text("  "), Err(AppError::MalformedResponse(_))));
    }
}
