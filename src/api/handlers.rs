//! API request handlers

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use tracing::info;

use super::cache::PipelineCache;
use super::error::ApiError;
use super::fanout::answer_all;
use super::fanout::FanOutOptions;
use super::types::HealthResponse;
use super::types::QuestionRequest;
use super::types::QuestionResponse;
use crate::config::AppConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<PipelineCache>,
    pub api_key: Option<String>,
    pub fanout: FanOutOptions,
}

impl AppState {
    pub fn new(cache: Arc<PipelineCache>, config: &AppConfig) -> Self {
        Self {
            cache,
            api_key: config.api_key().map(str::to_string),
            fanout: FanOutOptions::from_config(config),
        }
    }
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.cache.stats();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cached_documents: state.cache.len(),
        cache_hit_rate: stats.hit_rate(),
        failed_builds: stats.failed_builds,
    })
}

/// Answer questions about a document (POST /hackrx/run)
pub async fn run_questions(
    State(state): State<AppState>,
    Json(request): Json<QuestionRequest>,
) -> Result<Json<QuestionResponse>, ApiError> {
    info!(
        "POST /hackrx/run: {} questions for {}",
        request.questions.len(),
        request.documents
    );

    let pipeline = state.cache.get_or_create(&request.documents).await?;
    let answers = answer_all(pipeline.as_ref(), &request.questions, state.fanout).await?;

    Ok(Json(QuestionResponse { answers }))
}
