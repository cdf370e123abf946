// Main entry point for the Legal Clerk API server

use anyhow::{Context, Result};
use openai_client::OpenAIClient;
use server_core::{server::build_app, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Legal Clerk RAG Agent API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(model = %config.openai_model, "Configuration loaded");

    // Build application
    let openai_client = OpenAIClient::new(config.openai_api_key);
    let app = build_app(openai_client, config.openai_model);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Solve endpoint: http://localhost:{}/solve", config.port);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
