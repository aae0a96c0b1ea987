//! Generation provider abstraction
//!
//! The converter talks to a text generation service only through
//! [`LLMProvider`], so the HTTP provider can be swapped for a fake in tests.

use crate::error::{Result, TextToSqlError};
use async_trait::async_trait;

/// Token accounting reported by the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt: Option<u32>,
    pub completion: Option<u32>,
    pub total: Option<u32>,
}

impl TokenUsage {
    /// Reported total, or prompt plus completion when only those are known
    pub fn total(&self) -> Option<u32> {
        self.total
            .or_else(|| Some(self.prompt? + self.completion?))
    }
}

/// One completion
#[derive(Debug, Clone, PartialEq)]
pub struct LLMResponse {
    /// Generated text, untrimmed
    pub content: String,
    pub usage: TokenUsage,
    /// Model version that answered, when the service reports it
    pub model: Option<String>,
    /// Why generation stopped (e.g. `STOP`, `MAX_TOKENS`)
    pub finish_reason: Option<String>,
}

impl LLMResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: TokenUsage::default(),
            model: None,
            finish_reason: None,
        }
    }

    pub fn get_total_tokens(&self) -> Option<u32> {
        self.usage.total()
    }
}

/// Sampling settings; `None` leaves the service default in place
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationParams {
    pub temperature: Option<f32>,
}

impl GenerationParams {
    /// Temperature 0.0, everything else left to the service
    pub fn deterministic() -> Self {
        Self::default().with_temperature(0.0)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A text generation service
///
/// One request in, one completion out. Implementations do not retry.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion for a single text prompt
    async fn generate(
        &self,
        prompt: &str,
        params: Option<&GenerationParams>,
    ) -> Result<LLMResponse>;

    /// Name used in messages and errors
    fn provider_name(&self) -> &str;

    /// Model identifier requests are sent to
    fn model(&self) -> &str;

    fn has_api_key(&self) -> bool;

    /// Fails with [`TextToSqlError::LLMApiKeyMissing`] when no key is set
    fn validate_config(&self) -> Result<()> {
        if self.has_api_key() {
            Ok(())
        } else {
            Err(TextToSqlError::LLMApiKeyMissing(
                self.provider_name().to_string(),
            ))
        }
    }
}
