//! POST /solve - the evaluation-harness endpoint.

use axum::{extract::Extension, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::kernel::solver::{solve, SolveResult};
use crate::server::app::AppState;

/// Request body for /solve.
#[derive(Debug, Deserialize)]
pub struct SolveRequest {
    /// The legal question to answer.
    #[serde(default)]
    pub query: Option<String>,
    /// Alias accepted for fact-check harness compatibility.
    #[serde(default)]
    pub claim: Option<String>,
    /// Knowledge-base search endpoint for this request.
    #[serde(default)]
    pub kb_search_url: Option<String>,
}

/// Error body matching the harness's expected `{detail}` shape.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(detail: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            detail: detail.to_string(),
        }),
    )
}

/// Answer one zoning question.
///
/// Returns a structured response with the agent's reasoning, the document
/// IDs it used, the final answer, and citations with quotes. The response
/// always carries all four fields, even on degraded paths; only non-quota
/// model failures become a 500 here.
pub async fn solve_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<SolveRequest>,
) -> Result<Json<SolveResult>, ApiError> {
    let query = [request.query.as_deref(), request.claim.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|q| !q.is_empty())
        .map(str::to_string)
        .ok_or_else(|| bad_request("Must provide either 'query' or 'claim' parameter"))?;

    let kb_search_url = request
        .kb_search_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| bad_request("Must provide 'kb_search_url' parameter"))?;

    tracing::info!(
        query_preview = %query.chars().take(100).collect::<String>(),
        kb_search_url = %kb_search_url,
        "Processing legal question"
    );

    let result = solve(&state.openai_client, &state.model, &query, kb_search_url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Solve pipeline failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    detail: format!("Internal server error: {}", e),
                }),
            )
        })?;

    tracing::info!(
        documents = result.retrieved_context_ids.len(),
        "Request processed"
    );

    Ok(Json(result))
}
