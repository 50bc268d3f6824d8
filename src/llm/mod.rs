//! LLM (chat completion) module
//!
//! Talks to an OpenAI-compatible `/chat/completions` endpoint or to Ollama's
//! `/api/chat`, and provides the prompt templates used by the RAG pipeline.

pub mod client;
pub mod prompts;

use async_trait::async_trait;
pub use client::ChatMessage;
pub use client::LlmService;
pub use prompts::PromptTemplate;
pub use prompts::RagPrompts;

use crate::errors::Result;

/// Anything that can complete a prompt
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
