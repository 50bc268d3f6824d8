//! API request and response types

use serde::Deserialize;
use serde::Serialize;

/// `POST /hackrx/run` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRequest {
    /// URL of the document to answer from
    pub documents: String,
    pub questions: Vec<String>,
}

/// Answers aligned positionally with the request's questions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionResponse {
    pub answers: Vec<String>,
}

/// Error body; never carries internal detail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub detail: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cached_documents: usize,
    /// Share of pipeline lookups served without building
    pub cache_hit_rate: f64,
    pub failed_builds: u64,
}
