//! Minimal OpenAI REST API client.
//!
//! Supports chat completions with function calling, plus an [`Agent`] that
//! drives the tool-execution loop until the model produces a final text
//! answer.
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{OpenAIClient, Tool};
//!
//! let client = OpenAIClient::from_env()?;
//!
//! let response = client
//!     .agent("gpt-4o-mini")
//!     .system("You are a research assistant")
//!     .tool(WebSearch)
//!     .temperature(0.0)
//!     .build()
//!     .chat("What is the population of Tokyo?")
//!     .await?;
//! ```

pub mod agent;
pub mod error;
pub mod tool;

pub use agent::{Agent, AgentBuilder, AgentResponse};
pub use error::{OpenAIError, Result};
pub use tool::{ErasedTool, Tool, ToolCall, ToolDefinition, ToolError};

use reqwest::Client;
use tracing::warn;

/// OpenAI API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| OpenAIError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (proxies, compatible providers, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create an agent builder for the specified model.
    pub fn agent(&self, model: impl Into<String>) -> AgentBuilder<'_> {
        AgentBuilder::new(self, model)
    }

    /// POST a chat-completions request body and return the parsed response.
    pub(crate) async fn post_chat(&self, body: &serde_json::Value) -> Result<serde_json::Value> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "OpenAI request failed");
                OpenAIError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenAI API error");
            // Keep the status code in the message: callers match on it to
            // recognize rate-limit (429) and quota conditions.
            return Err(OpenAIError::Api(format!(
                "OpenAI API error ({}): {}",
                status.as_u16(),
                error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = OpenAIClient::new("sk-test").with_base_url("https://custom.api.com");

        assert_eq!(client.api_key, "sk-test");
        assert_eq!(client.base_url(), "https://custom.api.com");
    }

    #[test]
    fn test_from_env_missing_key() {
        // Only meaningful when the variable is absent; skip otherwise.
        if std::env::var("OPENAI_API_KEY").is_ok() {
            return;
        }
        assert!(matches!(
            OpenAIClient::from_env(),
            Err(OpenAIError::Config(_))
        ));
    }
}
