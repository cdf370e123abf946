//! Agent with an automatic tool-calling loop.
//!
//! The agent sends the conversation to the model, executes any requested
//! tool calls, feeds the results back, and repeats until the model answers
//! with plain text or the iteration cap is reached.

use crate::tool::{ErasedTool, Tool, ToolCall};
use crate::{OpenAIClient, OpenAIError, Result};
use tracing::{debug, info, warn};

/// Builder for creating an [`Agent`].
pub struct AgentBuilder<'a> {
    client: &'a OpenAIClient,
    model: String,
    system_prompt: Option<String>,
    tools: Vec<Box<dyn ErasedTool>>,
    max_iterations: usize,
    temperature: Option<f32>,
}

impl<'a> AgentBuilder<'a> {
    pub(crate) fn new(client: &'a OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            system_prompt: None,
            tools: Vec::new(),
            max_iterations: 10,
            temperature: None,
        }
    }

    /// Set the system prompt.
    pub fn system(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Add a tool the model may call.
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.push(Box::new(tool));
        self
    }

    /// Cap the number of model round-trips. Default is 10.
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Build the agent.
    pub fn build(self) -> Agent<'a> {
        Agent {
            client: self.client,
            model: self.model,
            system_prompt: self.system_prompt,
            tools: self.tools,
            max_iterations: self.max_iterations,
            temperature: self.temperature,
        }
    }
}

/// An AI agent that can use tools to accomplish tasks.
pub struct Agent<'a> {
    client: &'a OpenAIClient,
    model: String,
    system_prompt: Option<String>,
    tools: Vec<Box<dyn ErasedTool>>,
    max_iterations: usize,
    temperature: Option<f32>,
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final text response from the model.
    pub content: String,

    /// Names of the tool calls made during the run, in order.
    pub tool_calls_made: Vec<String>,

    /// Number of model round-trips made.
    pub iterations: usize,
}

impl<'a> Agent<'a> {
    /// Send a user message and run the tool loop to completion.
    pub async fn chat(&self, user_message: impl Into<String>) -> Result<AgentResponse> {
        let mut messages: Vec<serde_json::Value> = Vec::new();

        if let Some(ref system) = self.system_prompt {
            messages.push(serde_json::json!({
                "role": "system",
                "content": system
            }));
        }

        messages.push(serde_json::json!({
            "role": "user",
            "content": user_message.into()
        }));

        let tool_defs: Vec<serde_json::Value> = self
            .tools
            .iter()
            .map(|t| t.definition().to_openai_format())
            .collect();

        let mut tool_calls_made = Vec::new();
        let mut iterations = 0;

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                warn!(
                    max_iterations = self.max_iterations,
                    "Agent reached max iterations"
                );
                return Err(OpenAIError::Api(format!(
                    "Agent reached max iterations ({})",
                    self.max_iterations
                )));
            }

            info!(
                iteration = iterations,
                model = %self.model,
                message_count = messages.len(),
                "Agent iteration starting"
            );

            let mut request = serde_json::json!({
                "model": self.model,
                "messages": messages,
            });
            if !self.tools.is_empty() {
                request["tools"] = serde_json::Value::Array(tool_defs.clone());
                request["tool_choice"] = serde_json::json!("auto");
            }
            if let Some(temp) = self.temperature {
                request["temperature"] = serde_json::json!(temp);
            }

            let response = self.client.post_chat(&request).await?;

            let message = response
                .get("choices")
                .and_then(|c| c.get(0))
                .and_then(|c| c.get("message"))
                .ok_or_else(|| OpenAIError::Parse("No message in response".into()))?;

            let tool_calls = message
                .get("tool_calls")
                .and_then(|tc| tc.as_array())
                .cloned()
                .unwrap_or_default();

            if tool_calls.is_empty() {
                // Plain text response ends the run.
                let content = message
                    .get("content")
                    .and_then(|c| c.as_str())
                    .unwrap_or("")
                    .to_string();

                info!(
                    iterations = iterations,
                    tool_calls_total = tool_calls_made.len(),
                    response_len = content.len(),
                    "Agent finished"
                );
                debug!(response_content = %content, "Agent final response content");

                return Ok(AgentResponse {
                    content,
                    tool_calls_made,
                    iterations,
                });
            }

            // The assistant message carrying the tool calls must precede the
            // tool results in the history.
            messages.push(message.clone());

            for tc_value in &tool_calls {
                let Some(tc) = ToolCall::from_openai_value(tc_value) else {
                    warn!("Failed to parse tool call: {:?}", tc_value);
                    continue;
                };

                info!(
                    tool = %tc.name,
                    id = %tc.id,
                    arguments = %tc.arguments,
                    "Executing tool call"
                );
                tool_calls_made.push(tc.name.clone());

                let result = self.execute_tool(&tc).await;

                messages.push(serde_json::json!({
                    "role": "tool",
                    "tool_call_id": tc.id,
                    "content": result
                }));
            }
        }
    }

    /// Execute a single tool call. Failures are stringified and handed back
    /// to the model in-band rather than aborting the run.
    async fn execute_tool(&self, call: &ToolCall) -> String {
        let Some(tool) = self.tools.iter().find(|t| t.name() == call.name) else {
            warn!(tool = %call.name, "Unknown tool requested");
            return format!("Error: Unknown tool '{}'", call.name);
        };

        match tool.call_erased(&call.arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                format!("Error executing tool: {}", e)
            }
        }
    }
}
