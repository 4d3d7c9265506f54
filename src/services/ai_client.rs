//! Structured-extraction client for the Gemini API.
//!
//! The routes only see the `StructuredExtractor` trait: a prompt plus a field
//! schema in, a JSON value conforming to that schema out, or a typed
//! `AiError` the route maps onto a status code.

use anyhow::{Context, Result};
use axum::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::config::Settings;

/// One structured-extraction call.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Short label for logs.
    pub name: &'static str,
    pub prompt: String,
    pub schema: Value,
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Google Generative AI API key is missing")]
    MissingApiKey,

    #[error("AI service rejected the API key: {0}")]
    Unauthorized(String),

    #[error("Cannot connect to AI service: {0}")]
    Network(String),

    #[error("AI service rate limit or quota exceeded: {0}")]
    RateLimited(String),

    #[error("AI service timeout: {0}")]
    Timeout(String),

    #[error("Invalid AI service response: {0}")]
    InvalidResponse(String),

    #[error("{message}")]
    Service { status: u16, message: String },
}

impl AiError {
    /// Classify a non-success HTTP answer from the model API.
    ///
    /// Quota wording wins over the status, so a 403 for an exhausted quota
    /// is still a rate limit.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        if mentions_rate_limit(&message) {
            return Self::RateLimited(message);
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized(message),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Self::Timeout(message),
            StatusCode::BAD_REQUEST if message.to_lowercase().contains("api key") => {
                Self::Unauthorized(message)
            }
            _ => Self::from_message(status.as_u16(), message),
        }
    }

    /// Fall back to the wording of the message, as the upstream SDKs do.
    fn from_message(status: u16, message: String) -> Self {
        let lower = message.to_lowercase();
        if mentions_rate_limit(&lower) {
            Self::RateLimited(message)
        } else if lower.contains("timeout") || lower.contains("timed out") {
            Self::Timeout(message)
        } else {
            Self::Service { status, message }
        }
    }

    fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

fn mentions_rate_limit(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("rate limit") || lower.contains("quota")
}

/// Prompt + schema in, schema-conforming JSON out.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    /// Whether credentials are present at all.
    fn is_configured(&self) -> bool;

    async fn generate_object(&self, request: &ExtractionRequest) -> Result<Value, AiError>;

    async fn health_check(&self) -> Result<()>;
}

/// Client for `models/{model}:generateContent` with JSON response schemas.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    generate_url: Url,
    model_url: Url,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.ai_timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        let base = Url::parse(&format!(
            "{}/",
            settings.gemini_api_base_url.trim_end_matches('/')
        ))
        .context("GEMINI_API_BASE_URL is not a valid URL")?;
        let model_path = format!("v1beta/models/{}", settings.gemini_model);
        let model_url = base
            .join(&model_path)
            .context("Invalid Gemini model name")?;
        let generate_url = base
            .join(&format!("{}:generateContent", model_path))
            .context("Invalid Gemini model name")?;

        if settings.gemini_api_key.is_none() {
            warn!("GOOGLE_GENERATIVE_AI_API_KEY is not set - AI routes will fail");
        }
        tracing::info!(model = %settings.gemini_model, "Gemini client initialized");

        Ok(Self {
            client,
            generate_url,
            model_url,
            api_key: settings.gemini_api_key.clone(),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
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
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Pull the JSON object out of the first candidate's text parts.
fn extract_object(response: GenerateContentResponse) -> Result<Value, AiError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(AiError::InvalidResponse(reason));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "empty response".to_string());
        return Err(AiError::InvalidResponse(reason));
    }

    serde_json::from_str(strip_code_fences(&text))
        .map_err(|e| AiError::InvalidResponse(format!("response is not JSON: {}", e)))
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[async_trait]
impl StructuredExtractor for GeminiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(skip(self, request), fields(extraction = request.name))]
    async fn generate_object(&self, request: &ExtractionRequest) -> Result<Value, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::MissingApiKey)?;

        let body = GenerateContentRequest {
            contents: [RequestContent {
                role: "user",
                parts: [RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &request.schema,
            },
        };

        debug!(url = %self.generate_url, prompt_chars = request.prompt.chars().count(), "AI service request");

        let response = self
            .client
            .post(self.generate_url.clone())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "AI service request failed");
                AiError::from_transport(e)
            })?;

        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<GeminiErrorEnvelope>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("AI service error: {}", status));

            error!(status = %status, message = %message, "AI service error");
            return Err(AiError::from_status(status, message));
        }

        let parsed = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(AiError::from_transport)?;

        extract_object(parsed)
    }

    async fn health_check(&self) -> Result<()> {
        let api_key = self
            .api_key
            .as_deref()
            .context("GOOGLE_GENERATIVE_AI_API_KEY is not set")?;

        self.client
            .get(self.model_url.clone())
            .header("x-goog-api-key", api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .context("AI service health check failed")?
            .error_for_status()
            .context("AI service unhealthy")?;

        Ok(())
    }
}
