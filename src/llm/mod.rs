//! LLM integration module
//!
//! This module provides the trait-based provider abstraction, the Gemini
//! implementation and the converter that turns questions into SQL.

pub mod client;
pub mod converter;
pub mod provider;

// Provider implementations
pub mod providers {
    pub mod gemini;
}

// Re-exports
pub use converter::TextToSqlConverter;
pub use provider::{GenerationParams, LLMProvider, LLMResponse, TokenUsage};
