//! Error types for the OpenAI client.

use thiserror::Error;

/// Result type for OpenAI client operations.
pub type Result<T> = std::result::Result<T, OpenAIError>;

/// Errors returned by the OpenAI client.
///
/// `Api` messages carry the HTTP status code and response body verbatim so
/// callers can classify failures (rate limits, quota exhaustion) by text.
#[derive(Debug, Error)]
pub enum OpenAIError {
    /// Missing API key or invalid client settings.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failure or timeout before a response arrived.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the API.
    #[error("API error: {0}")]
    Api(String),

    /// The response body could not be interpreted.
    #[error("Parse error: {0}")]
    Parse(String),
}
