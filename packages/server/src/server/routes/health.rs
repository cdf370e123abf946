use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct RootResponse {
    status: String,
    service: String,
    endpoint: String,
    description: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    service: String,
    version: String,
    endpoints: Endpoints,
    openai_configured: bool,
}

#[derive(Serialize)]
pub struct Endpoints {
    solve: String,
    health: String,
}

/// Minimal liveness check at the root path.
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok".to_string(),
        service: "Legal Clerk RAG Agent".to_string(),
        endpoint: "/solve".to_string(),
        description: "Submit zoning law questions to get AI-powered legal analysis".to_string(),
    })
}

/// Detailed health check with endpoint inventory.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "Legal Clerk RAG Agent".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: Endpoints {
            solve: "/solve - Main legal question answering endpoint".to_string(),
            health: "/health - Detailed health check".to_string(),
        },
        openai_configured: std::env::var("OPENAI_API_KEY").is_ok(),
    })
}
