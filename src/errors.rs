use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolicyQaError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Document fetch error: {0}")]
    DocumentFetchError(String),

    #[error("Pipeline error: {0}")]
    PipelineError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Configuration loading error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Custom(String),
}

impl PolicyQaError {
    /// Stable label for logs and metrics
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AuthError(_) => "auth",
            Self::DocumentFetchError(_) => "document_fetch",
            Self::PipelineError(_) => "pipeline",
            Self::QueryError(_) => "query",
            Self::EmbeddingError(_) => "embedding",
            Self::LlmError(_) => "llm",
            Self::HttpError(_) => "http",
            Self::ConfigError(_) | Self::Config(_) => "config",
            Self::JsonError(_) => "json",
            Self::Io(_) => "io",
            Self::Custom(_) => "custom",
        }
    }

    /// Whether the error is an authentication failure
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::AuthError(_))
    }
}

impl From<reqwest::Error> for PolicyQaError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PolicyQaError>;
