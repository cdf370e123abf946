//! Tool-calling traits and types for OpenAI function calling.
//!
//! Tools declare typed arguments whose JSON schema is generated with
//! `schemars`, so the model sees an accurate parameter description without
//! hand-written schema JSON.
//!
//! # Example
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//! use openai_client::Tool;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct SearchArgs {
//!     query: String,
//! }
//!
//! struct WebSearch;
//!
//! #[async_trait]
//! impl Tool for WebSearch {
//!     const NAME: &'static str = "web_search";
//!     type Args = SearchArgs;
//!     type Output = Vec<String>;
//!     type Error = anyhow::Error;
//!
//!     fn description(&self) -> &str {
//!         "Search the web for information"
//!     }
//!
//!     async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
//!         Ok(vec![format!("Results for: {}", args.query)])
//!     }
//! }
//! ```

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A tool the model may call during an agent run.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool.
    const NAME: &'static str;

    /// Argument type (must derive `Deserialize` and `JsonSchema`).
    type Args: DeserializeOwned + JsonSchema + Send;

    /// Output type (must derive `Serialize`).
    type Output: Serialize + Send;

    /// Error type for failed calls.
    type Error: std::error::Error + Send + Sync + 'static;

    /// A description of what this tool does, shown to the model.
    fn description(&self) -> &str;

    /// Execute the tool with the given arguments.
    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error>;

    /// Generate the tool definition sent to the API.
    fn definition(&self) -> ToolDefinition {
        let schema = schemars::schema_for!(Self::Args);
        let mut parameters = serde_json::to_value(schema)
            .unwrap_or_else(|_| serde_json::json!({"type": "object"}));
        if let Some(map) = parameters.as_object_mut() {
            map.remove("$schema");
        }

        ToolDefinition {
            name: Self::NAME.to_string(),
            description: self.description().to_string(),
            parameters,
        }
    }
}

/// Tool definition in the shape the chat-completions API expects.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    /// The name of the tool.
    pub name: String,

    /// A description of what the tool does.
    pub description: String,

    /// JSON schema for the tool's parameters.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Convert to the API's `tools` array entry format.
    pub fn to_openai_format(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters
            }
        })
    }
}

/// A tool call requested by the model.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// The ID of this call (echoed back with the result).
    pub id: String,

    /// The name of the tool to call.
    pub name: String,

    /// The arguments as a JSON string.
    pub arguments: String,
}

impl ToolCall {
    /// Parse a tool call from the API's response format.
    pub fn from_openai_value(value: &serde_json::Value) -> Option<Self> {
        Some(Self {
            id: value.get("id")?.as_str()?.to_string(),
            name: value.get("function")?.get("name")?.as_str()?.to_string(),
            arguments: value
                .get("function")?
                .get("arguments")?
                .as_str()?
                .to_string(),
        })
    }

    /// Parse arguments into a typed struct.
    pub fn parse_args<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.arguments)
    }
}

/// Type-erased tool, allowing heterogeneous tools in one collection.
#[async_trait]
pub trait ErasedTool: Send + Sync {
    /// Get the tool's name.
    fn name(&self) -> &str;

    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Execute with JSON-string arguments, returning JSON-string output.
    async fn call_erased(&self, arguments: &str) -> Result<String, ToolError>;
}

/// Error type for erased tool calls.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Failed to parse tool arguments.
    #[error("Failed to parse arguments: {0}")]
    ArgumentParse(String),

    /// Tool execution failed.
    #[error("Tool execution failed: {0}")]
    Execution(String),

    /// Failed to serialize tool output.
    #[error("Failed to serialize output: {0}")]
    OutputSerialize(String),
}

/// Blanket implementation of `ErasedTool` for all `Tool` implementors.
#[async_trait]
impl<T: Tool> ErasedTool for T {
    fn name(&self) -> &str {
        T::NAME
    }

    fn definition(&self) -> ToolDefinition {
        Tool::definition(self)
    }

    async fn call_erased(&self, arguments: &str) -> Result<String, ToolError> {
        let args: T::Args = serde_json::from_str(arguments)
            .map_err(|e| ToolError::ArgumentParse(e.to_string()))?;

        let output = self
            .call(args)
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?;

        serde_json::to_string(&output).map_err(|e| ToolError::OutputSerialize(e.to_string()))
    }
}
