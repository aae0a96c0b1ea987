//! Google Gemini API Provider
//!
//! This module implements the LLMProvider trait for the Gemini
//! `generateContent` REST endpoint.

use crate::config::{LlmConfig, DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::error::{Result, TextToSqlError};
use crate::llm::client::LLMHttpClient;
use crate::llm::provider::{GenerationParams, LLMProvider, LLMResponse, TokenUsage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

const PROVIDER_NAME: &str = "Gemini";

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API provider
pub struct GeminiProvider {
    /// API key for authentication
    api_key: String,
    /// Model to use (e.g., "gemini-1.5-flash")
    model: String,
    /// API root, without trailing slash
    base_url: String,
    /// HTTP client for making requests
    client: LLMHttpClient,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    ///
    /// # Arguments
    /// * `api_key` - Google AI API key
    /// * `model` - Model identifier (defaults to gemini-1.5-flash)
    pub fn new(api_key: impl Into<String>, model: Option<String>) -> Result<Self> {
        let model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Ok(Self {
            api_key: api_key.into(),
            model: normalize_model(&model),
            base_url: DEFAULT_API_BASE.to_string(),
            client: LLMHttpClient::new()?,
        })
    }

    /// Create a provider from the application configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            api_key: config.api_key.clone(),
            model: normalize_model(&config.model),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: LLMHttpClient::with_timeout(config.timeout_secs)?,
        })
    }

    /// Point the provider at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Full URL of the generateContent method for the configured model
    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request(&self, prompt: &str, params: Option<&GenerationParams>) -> GeminiRequest {
        let generation_config = params.map(|p| GenerationConfig {
            temperature: p.temperature,
        });

        GeminiRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config,
        }
    }

    /// Extract the text of the first candidate
    fn extract_content(response: &GeminiResponse) -> Result<String> {
        let candidate = match response.candidates.first() {
            Some(candidate) => candidate,
            None => {
                let reason = response
                    .prompt_feedback
                    .as_ref()
                    .and_then(|f| f.block_reason.clone())
                    .unwrap_or_else(|| "no candidates returned".to_string());
                return Err(api_error(format!("Prompt rejected: {}", reason), 0));
            }
        };

        let text: String = candidate
            .content
            .as_ref()
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect::<String>())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate
                .finish_reason
                .clone()
                .unwrap_or_else(|| "unknown".to_string());
            return Err(api_error(
                format!("Response contained no text (finish reason: {})", reason),
                0,
            ));
        }

        Ok(text)
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn generate(
        &self,
        prompt: &str,
        params: Option<&GenerationParams>,
    ) -> Result<LLMResponse> {
        let request = self.build_request(prompt, params);
        let headers = LLMHttpClient::build_headers_with_auth(API_KEY_HEADER, &self.api_key)?;

        debug!(model = %self.model, prompt_len = prompt.len(), "sending generateContent request");
        let started = Instant::now();

        let response_text = self
            .client
            .post_json(PROVIDER_NAME, &self.endpoint(), headers, &request)
            .await
            .map_err(|e| match e {
                TextToSqlError::LLMApiError {
                    provider,
                    message,
                    status,
                } => TextToSqlError::LLMApiError {
                    provider,
                    message: error_message(&message),
                    status,
                },
                other => other,
            })?;

        let gemini_response: GeminiResponse = serde_json::from_str(&response_text)
            .map_err(|e| api_error(format!("Failed to parse response: {}", e), 0))?;

        let content = Self::extract_content(&gemini_response)?;
        let usage = gemini_response.usage_metadata.as_ref();

        info!(
            model = %self.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            total_tokens = usage.and_then(|u| u.total_token_count),
            "generation finished"
        );

        Ok(LLMResponse {
            content,
            usage: TokenUsage {
                prompt: usage.and_then(|u| u.prompt_token_count),
                completion: usage.and_then(|u| u.candidates_token_count),
                total: usage.and_then(|u| u.total_token_count),
            },
            model: gemini_response
                .model_version
                .clone()
                .or_else(|| Some(self.model.clone())),
            finish_reason: gemini_response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone()),
        })
    }

    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Accept both `gemini-1.5-flash` and `models/gemini-1.5-flash`
fn normalize_model(model: &str) -> String {
    model.trim().trim_start_matches("models/").to_string()
}

fn api_error(message: String, status: u16) -> TextToSqlError {
    TextToSqlError::LLMApiError {
        provider: PROVIDER_NAME.to_string(),
        message,
        status,
    }
}

/// Pull `error.message` out of a Google API error body, or return it as is
fn error_message(body: &str) -> String {
    serde_json::from_str::<GeminiErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| match (e.status, e.message) {
            (Some(status), Some(message)) => Some(format!("{}: {}", status, message)),
            (None, Some(message)) => Some(message),
            _ => None,
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Gemini API request format
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// A turn of the conversation
#[derive(Debug, Serialize, Deserialize, Clone)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Gemini API response format
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Token usage information
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: Option<String>,
    status: Option<String>,
}
