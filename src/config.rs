use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::PolicyQaError;
use crate::errors::Result;

/// Environment variable holding the shared API secret
pub const SECURITY_API_KEY_ENV: &str = "SECURITY_API_KEY";

/// Prefix for environment overrides, e.g. `POLICY_QA_LLM__LLM_MODEL`
pub const ENV_PREFIX: &str = "POLICY_QA";

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Remote model provider flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// `OpenAI`-compatible REST API
    OpenAI,
    /// Ollama local server
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Bearer token every request must present. `None` rejects everything.
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: "logs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    pub provider: Provider,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Concurrent single-text requests for providers without batch support
    pub parallel_requests: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAI,
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "text-embedding-3-small".to_string(),
            parallel_requests: default_parallel_requests(),
        }
    }
}

const fn default_parallel_requests() -> usize {
    16
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: Provider,
    pub llm_endpoint: String,
    pub llm_key: Option<String>,
    pub llm_model: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAI,
            llm_endpoint: "https://api.openai.com/v1".to_string(),
            llm_key: None,
            llm_model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 512,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub max_context_length: usize,
    pub max_concurrent_queries: usize,
    /// Per-question deadline; unset means wait indefinitely
    pub query_timeout_secs: Option<u64>,
    pub fetch_timeout_secs: u64,
    pub max_document_bytes: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            max_context_length: 6000,
            max_concurrent_queries: 16,
            query_timeout_secs: None,
            fetch_timeout_secs: 60,
            max_document_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
    pub embeddings: EmbeddingsConfig,
    pub llm: LlmConfig,
    pub rag: RagConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::build(path.as_ref(), true)
    }

    /// Load configuration from `config.toml` if present, falling back to defaults
    pub fn load() -> Result<Self> {
        Self::build(Path::new(DEFAULT_CONFIG_FILE), false)
    }

    fn build(path: &Path, required: bool) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(required))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Self = settings.try_deserialize()?;
        config.apply_security_env(std::env::var(SECURITY_API_KEY_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// `SECURITY_API_KEY` always wins over file and prefixed settings.
    /// An empty value counts as unset.
    pub fn apply_security_env(&mut self, value: Option<String>) {
        if let Some(key) = value {
            self.security.api_key = Some(key);
        }
        if self
            .security
            .api_key
            .as_deref()
            .is_some_and(|k| k.trim().is_empty())
        {
            self.security.api_key = None;
        }
    }

    /// Check settings that would otherwise fail deep inside a request
    pub fn validate(&self) -> Result<()> {
        let rag = &self.rag;
        if rag.chunk_size == 0 {
            return Err(PolicyQaError::ConfigError(
                "rag.chunk_size must be greater than zero".to_string(),
            ));
        }
        if rag.chunk_overlap >= rag.chunk_size {
            return Err(PolicyQaError::ConfigError(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                rag.chunk_overlap, rag.chunk_size
            )));
        }
        if rag.top_k == 0 {
            return Err(PolicyQaError::ConfigError(
                "rag.top_k must be greater than zero".to_string(),
            ));
        }
        if rag.max_concurrent_queries == 0 {
            return Err(PolicyQaError::ConfigError(
                "rag.max_concurrent_queries must be greater than zero".to_string(),
            ));
        }
        if self.embeddings.parallel_requests == 0 {
            return Err(PolicyQaError::ConfigError(
                "embeddings.parallel_requests must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(PolicyQaError::ConfigError(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        Ok(())
    }

    /// Copy with secrets masked, for display
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "********".to_string());
        let mut copy = self.clone();
        copy.security.api_key = mask(&self.security.api_key);
        copy.embeddings.api_key = mask(&self.embeddings.api_key);
        copy.llm.llm_key = mask(&self.llm.llm_key);
        copy
    }

    /// Get configured API secret
    pub fn api_key(&self) -> Option<&str> {
        self.security.api_key.as_deref()
    }

    /// Get LLM endpoint
    pub fn llm_endpoint(&self) -> &str {
        &self.llm.llm_endpoint
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.llm_model
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }
}
