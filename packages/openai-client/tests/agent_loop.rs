//! Agent tool-loop tests against an in-process mock chat-completions server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, routing::post, Json, Router};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use openai_client::{OpenAIClient, OpenAIError, Tool};

#[derive(Deserialize, JsonSchema)]
struct LookupArgs {
    key: String,
}

#[derive(Serialize)]
struct LookupResult {
    value: String,
}

struct LookupTool;

#[async_trait]
impl Tool for LookupTool {
    const NAME: &'static str = "lookup";
    type Args = LookupArgs;
    type Output = LookupResult;
    type Error = std::convert::Infallible;

    fn description(&self) -> &str {
        "Look up a value by key"
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        Ok(LookupResult {
            value: format!("value-for-{}", args.key),
        })
    }
}

/// Mock model: first call requests the `lookup` tool, second call returns a
/// final text answer that echoes the tool result it was given.
async fn mock_completions(
    State(calls): State<Arc<AtomicUsize>>,
    Json(request): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let call_number = calls.fetch_add(1, Ordering::SeqCst);

    if call_number == 0 {
        return Json(serde_json::json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "lookup",
                            "arguments": "{\"key\": \"population\"}"
                        }
                    }]
                }
            }]
        }));
    }

    // The tool result must have been appended to the history.
    let tool_message = request["messages"]
        .as_array()
        .and_then(|msgs| {
            msgs.iter()
                .find(|m| m.get("role").and_then(|r| r.as_str()) == Some("tool"))
        })
        .cloned()
        .unwrap_or_default();

    let tool_content = tool_message
        .get("content")
        .and_then(|c| c.as_str())
        .unwrap_or("")
        .to_string();

    Json(serde_json::json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": format!("The tool said: {}", tool_content)
            }
        }]
    }))
}

async fn spawn_mock_server() -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/chat/completions", post(mock_completions))
        .with_state(calls.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{}", addr), calls)
}

#[tokio::test]
async fn agent_runs_tool_loop_to_completion() {
    let (base_url, calls) = spawn_mock_server().await;

    let client = OpenAIClient::new("test-key").with_base_url(base_url);
    let response = client
        .agent("gpt-4o-mini")
        .system("You are a test assistant")
        .tool(LookupTool)
        .temperature(0.0)
        .build()
        .chat("What is the population?")
        .await
        .expect("agent run should succeed");

    assert_eq!(response.iterations, 2);
    assert_eq!(response.tool_calls_made, vec!["lookup".to_string()]);
    assert!(response.content.contains("value-for-population"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn agent_stops_at_iteration_cap() {
    // A mock that always requests another tool call never terminates on its
    // own; the cap must end the run with an error.
    let app = Router::new().route(
        "/chat/completions",
        post(|| async {
            Json(serde_json::json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_loop",
                            "type": "function",
                            "function": {
                                "name": "lookup",
                                "arguments": "{\"key\": \"again\"}"
                            }
                        }]
                    }
                }]
            }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let client = OpenAIClient::new("test-key").with_base_url(format!("http://{}", addr));
    let result = client
        .agent("gpt-4o-mini")
        .tool(LookupTool)
        .max_iterations(3)
        .build()
        .chat("loop forever")
        .await;

    match result {
        Err(OpenAIError::Api(msg)) => assert!(msg.contains("max iterations")),
        other => panic!("expected Api error, got {:?}", other.map(|r| r.content)),
    }
}

#[tokio::test]
async fn api_error_carries_status_code() {
    let app = Router::new().route(
        "/chat/completions",
        post(|| async {
            (
                axum::http::StatusCode::TOO_MANY_REQUESTS,
                "{\"error\": {\"code\": \"insufficient_quota\"}}",
            )
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let client = OpenAIClient::new("test-key").with_base_url(format!("http://{}", addr));
    let result = client
        .agent("gpt-4o-mini")
        .build()
        .chat("anything")
        .await;

    match result {
        Err(OpenAIError::Api(msg)) => {
            assert!(msg.contains("429"));
            assert!(msg.contains("insufficient_quota"));
        }
        other => panic!("expected Api error, got {:?}", other.map(|r| r.content)),
    }
}
