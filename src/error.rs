//! Error types for text-to-sql
//!
//! This module defines the error types used throughout the application.

use thiserror::Error;

/// Result type alias for text-to-sql
pub type Result<T> = std::result::Result<T, TextToSqlError>;

/// Main error type for text-to-sql
#[derive(Error, Debug)]
pub enum TextToSqlError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP-related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connecting to the server or to a database failed
    #[error("Failed to connect to {target}: {source}")]
    ConnectionFailed {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    /// An operation needed a connection that is not open yet
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// The server reported no databases visible to the credentials
    #[error("No databases found on the server")]
    NoDatabases,

    /// LLM API key is not configured
    #[error("API key missing for {0}. Set GOOGLE_API_KEY in the environment or .env file")]
    LLMApiKeyMissing(String),

    /// LLM API returned an error
    #[error("{provider} API error (status {status}): {message}")]
    LLMApiError {
        provider: String,
        message: String,
        status: u16,
    },

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Line editor errors
    #[error("Line editor error: {0}")]
    Readline(String),
}

impl TextToSqlError {
    /// Wrap a driver error raised while connecting to `target`
    pub fn connection(target: impl Into<String>, source: sqlx::Error) -> Self {
        Self::ConnectionFailed {
            target: target.into(),
            source,
        }
    }
}
