//! LLM HTTP Client
//!
//! A thin wrapper around `reqwest` for posting JSON to generation APIs.
//! Each call makes exactly one request; failures are returned to the caller.

use crate::error::{Result, TextToSqlError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use std::str::FromStr;
use std::time::Duration;

/// Default timeout for HTTP requests (in seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// HTTP client for LLM API requests
#[derive(Clone)]
pub struct LLMHttpClient {
    /// Reqwest HTTP client
    client: Client,
    /// Request timeout
    timeout: Duration,
}

impl LLMHttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Create a new HTTP client with custom timeout
    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Make a POST request with a JSON body
    ///
    /// # Returns
    /// The response body on a 2xx status. Any other status becomes
    /// [`TextToSqlError::LLMApiError`] carrying the raw body.
    pub async fn post_json<T: Serialize>(
        &self,
        provider: &str,
        url: &str,
        headers: HeaderMap,
        body: &T,
    ) -> Result<String> {
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        if status.is_success() {
            return Ok(text);
        }

        Err(TextToSqlError::LLMApiError {
            provider: provider.to_string(),
            message: text,
            status: status.as_u16(),
        })
    }

    /// Build JSON headers with a custom authorization header
    pub fn build_headers_with_auth(auth_header: &str, auth_value: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let name = HeaderName::from_str(auth_header).map_err(|_| {
            TextToSqlError::Config(format!("Invalid header name: {}", auth_header))
        })?;
        let mut value = HeaderValue::from_str(auth_value).map_err(|_| {
            TextToSqlError::Config(format!("Invalid value for header {}", auth_header))
        })?;
        value.set_sensitive(true);

        headers.insert(name, value);
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_with_timeout() {
        let client = LLMHttpClient::with_timeout(30).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(30));

        let client = LLMHttpClient::new().unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_headers_building() {
        let headers = LLMHttpClient::build_headers_with_auth("x-goog-api-key", "test-key").unwrap();
        assert_eq!(headers.get("content-type").unwrap(), "application/json");
        assert_eq!(headers.get("x-goog-api-key").unwrap(), "test-key");
        assert!(headers.get("x-goog-api-key").unwrap().is_sensitive());
    }

    #[test]
    fn test_invalid_header_value() {
        let result = LLMHttpClient::build_headers_with_auth("x-goog-api-key", "bad\nkey");
        assert!(matches!(result, Err(TextToSqlError::Config(_))));
    }
}
