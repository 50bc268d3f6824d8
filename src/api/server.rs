//! HTTP server implementation

use std::sync::Arc;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing::warn;

use crate::api::cache::PipelineCache;
use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::rag::DocumentPipelineFactory;
use crate::Result;

/// Wrap the API routes in the tracing, compression and optional CORS layers
pub fn build_app(state: AppState, enable_cors: bool) -> Router {
    let mut app = routes::api_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Start the API server
pub async fn serve_api(
    config: &AppConfig,
    host: String,
    port: u16,
    enable_cors: bool,
) -> Result<()> {
    info!("🚀 Starting policy QA API server...");

    if config.api_key().is_none() {
        warn!("SECURITY_API_KEY is not set; every /hackrx/run request will be rejected");
    }

    let factory = Arc::new(DocumentPipelineFactory::new(config)?);
    let cache = Arc::new(PipelineCache::new(factory));
    let state = AppState::new(cache, config);

    let app = build_app(state, enable_cors);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{}", addr);
    info!("🤖 LLM: {} via {}", config.llm_model(), config.llm_endpoint());
    info!("🔢 Embeddings: {}", config.embedding_model());
    info!("");
    info!("Available endpoints:");
    info!("  POST /hackrx/run - Answer questions about a document");
    info!("  GET  /health     - Health check");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
