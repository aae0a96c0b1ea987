//! Natural language to SQL conversion
//!
//! [`TextToSqlConverter`] renders the loaded schema and a question into a
//! fixed prompt, asks the provider for a completion at temperature 0.0 and
//! returns the trimmed text. The text is not checked for being valid SQL.

use crate::config::LlmConfig;
use crate::database::schema::SchemaIndex;
use crate::error::{Result, TextToSqlError};
use crate::llm::provider::{GenerationParams, LLMProvider};
use crate::llm::providers::gemini::GeminiProvider;
use tracing::{debug, warn};

/// Converts questions into SQL for the current schema
pub struct TextToSqlConverter {
    schema: SchemaIndex,
    provider: Box<dyn LLMProvider>,
    params: GenerationParams,
}

impl TextToSqlConverter {
    /// Create a converter; fails when the provider has no API key
    pub fn new(schema: SchemaIndex, provider: Box<dyn LLMProvider>) -> Result<Self> {
        provider.validate_config()?;
        Ok(Self {
            schema,
            provider,
            params: GenerationParams::deterministic(),
        })
    }

    /// Create a converter backed by Gemini
    pub fn from_config(schema: SchemaIndex, config: &LlmConfig) -> Result<Self> {
        let provider = GeminiProvider::from_config(config)?;
        Self::new(schema, Box::new(provider))
    }

    pub fn schema(&self) -> &SchemaIndex {
        &self.schema
    }

    /// Replace the schema after a (re)load
    pub fn set_schema(&mut self, schema: SchemaIndex) {
        self.schema = schema;
    }

    pub fn provider(&self) -> &dyn LLMProvider {
        self.provider.as_ref()
    }

    /// One `Table (col1, col2, ...)` line per table, in schema order
    pub fn format_schema(&self) -> String {
        self.schema.format_for_llm()
    }

    /// Build the prompt sent for `question`
    pub fn build_prompt(&self, question: &str) -> String {
        format!(
            "You are an assistant that converts natural language into SQL.\n\
             Always end the SQL query you generate with a semicolon.\n\
             Database schema:\n\
             {}\n\
             Question:\n\
             {}\n\
             Answer only with the complete SQL query, without explanations:",
            self.format_schema(),
            question
        )
    }

    /// Generate SQL for a natural-language question
    ///
    /// An empty question is rejected without contacting the provider.
    pub async fn generate_sql(&self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TextToSqlError::InvalidInput("empty question".to_string()));
        }

        let prompt = self.build_prompt(question);
        let response = match self.provider.generate(&prompt, Some(&self.params)).await {
            Ok(response) => response,
            Err(e) => {
                warn!(provider = self.provider.provider_name(), error = %e, "SQL generation failed");
                return Err(e);
            }
        };

        let sql = response.content.trim().to_string();
        if sql.is_empty() {
            return Err(TextToSqlError::LLMApiError {
                provider: self.provider.provider_name().to_string(),
                message: "empty completion".to_string(),
                status: 0,
            });
        }

        debug!(
            model = ?response.model,
            tokens = response.get_total_tokens(),
            finish_reason = ?response.finish_reason,
            sql = %sql,
            "SQL generated"
        );
        Ok(sql)
    }
}
