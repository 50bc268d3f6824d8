//! API server module for answering document questions over REST

pub mod auth;
pub mod cache;
pub mod error;
pub mod fanout;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use cache::PipelineCache;
pub use error::ApiError;
pub use handlers::AppState;
pub use server::build_app;
pub use server::serve_api;
