//! Knowledge-base search client and result formatting.
//!
//! The search endpoint is provided per request by the evaluation harness, so
//! the client is constructed per request and threaded down the call chain
//! rather than held as process state.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use openai_client::Tool;

/// Keywords whose presence in document text hints at an exception or
/// override clause. Matched as case-insensitive substrings.
const CONFLICT_INDICATORS: &[&str] = &[
    "except",
    "however",
    "unless",
    "provided",
    "subject to",
    "notwithstanding",
    "conflict",
    "override",
    "supersede",
];

const SEARCH_TOP_K: usize = 12;
const SEARCH_TIMEOUT: Duration = Duration::from_secs(35);

/// One ranked document from the knowledge-base search endpoint.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub identifier: String,
    pub content: String,
    pub score: f64,
}

#[derive(Debug, Serialize)]
struct KbSearchRequest<'a> {
    query: &'a str,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct KbSearchResponse {
    #[serde(default)]
    results: Vec<KbSearchResult>,
}

/// Raw result row; every field is optional and defaulted on our side.
#[derive(Debug, Deserialize)]
struct KbSearchResult {
    doc_id: Option<String>,
    content: Option<String>,
    score: Option<f64>,
}

/// Knowledge-base search seam. The HTTP implementation talks to the
/// harness-provided endpoint; tests substitute a stub.
#[async_trait]
pub trait KnowledgeSearch: Send + Sync {
    /// Run one search, returning results in the service's relevance order.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// HTTP client for the knowledge-base search endpoint.
pub struct HttpKnowledgeBase {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpKnowledgeBase {
    /// Create a client for one request's endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl KnowledgeSearch for HttpKnowledgeBase {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let request = KbSearchRequest {
            query,
            top_k: SEARCH_TOP_K,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .context("Failed to send knowledge-base search request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Knowledge-base API error {}: {}", status, body);
        }

        let kb_response: KbSearchResponse = response
            .json()
            .await
            .context("Failed to parse knowledge-base response")?;

        // Missing fields are tolerated: synthesize an identifier from the
        // 1-based position, default the score to 0.0.
        Ok(kb_response
            .results
            .into_iter()
            .enumerate()
            .map(|(i, r)| SearchResult {
                identifier: r.doc_id.unwrap_or_else(|| format!("unknown_doc_{}", i + 1)),
                content: r.content.unwrap_or_default(),
                score: r.score.unwrap_or(0.0),
            })
            .collect())
    }
}

/// Render a result list into the annotated block the model sees.
///
/// Order-preserving and total: every input document appears exactly once,
/// tagged with a conflict flag computed from [`CONFLICT_INDICATORS`].
pub fn format_results(query: &str, search_type: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("SEARCH [{}]: No documents found for '{}'", search_type, query);
    }

    let mut lines = vec![
        format!("=== {} SEARCH: '{}' ===", search_type.to_uppercase(), query),
        format!("Found {} documents\n", results.len()),
    ];

    for (i, result) in results.iter().enumerate() {
        let content_lower = result.content.to_lowercase();
        let has_conflicts = CONFLICT_INDICATORS
            .iter()
            .any(|keyword| content_lower.contains(keyword));

        lines.push(format!("DOCUMENT #{}:", i + 1));
        lines.push(format!("  ID: {}", result.identifier));
        lines.push(format!("  Score: {:.4}", result.score));
        lines.push(format!(
            "  Potential Conflicts: {}",
            if has_conflicts { "YES" } else { "NO" }
        ));
        lines.push(format!("  Content: {}", result.content));
        lines.push(format!("  {}\n", "---".repeat(20)));
    }

    lines.join("\n")
}

/// Run one search and render the block. Failures are rendered in-band: the
/// model receives the error string as ordinary tool output and can adjust
/// its search strategy instead of aborting.
pub async fn format_search(kb: &dyn KnowledgeSearch, query: &str, search_type: &str) -> String {
    match kb.search(query).await {
        Ok(results) => format_results(query, search_type, &results),
        Err(e) => format!("SEARCH ERROR [{}]: {}", search_type, e),
    }
}

// =============================================================================
// Search tool
// =============================================================================

/// Arguments for a zoning-code search.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ZoningSearchArgs {
    /// Search terms to run against the zoning knowledge base.
    pub query: String,
    /// Which search angle this query covers: general, conflicts,
    /// restrictions, boundaries, exceptions, or procedures.
    #[serde(default = "default_search_type")]
    pub search_type: String,
}

fn default_search_type() -> String {
    "general".to_string()
}

/// Tool exposing the knowledge-base search to the model. Holds the
/// request-scoped search client.
pub struct ZoningSearchTool {
    kb: Arc<dyn KnowledgeSearch>,
}

impl ZoningSearchTool {
    pub fn new(kb: Arc<dyn KnowledgeSearch>) -> Self {
        Self { kb }
    }
}

#[async_trait]
impl Tool for ZoningSearchTool {
    const NAME: &'static str = "search_knowledge_base";
    type Args = ZoningSearchArgs;
    type Output = String;
    type Error = std::convert::Infallible;

    fn description(&self) -> &str {
        "Search the Alphaville Zoning Code knowledge base. Returns ranked documents annotated with conflict indicators. Call once per search angle."
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        Ok(format_search(self.kb.as_ref(), &args.query, &args.search_type).await)
    }
}
