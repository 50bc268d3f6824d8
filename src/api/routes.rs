//! API route definitions

use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::auth;
use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create the API router
///
/// `/hackrx/run` sits behind bearer auth; `/health` is open.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Question answering
        .route("/hackrx/run", post(handlers::run_questions))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ))
        // Health check
        .route("/health", get(handlers::health))
        .with_state(state)
}
