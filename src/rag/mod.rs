//! RAG (Retrieval-Augmented Generation) module
//!
//! One [`Pipeline`] answers questions about one document:
//! - Download and text extraction ([`DocumentLoader`])
//! - Chunking with overlap ([`Chunker`])
//! - Embedding and an in-memory vector index ([`VectorIndex`])
//! - Context assembly and LLM answer generation
//!
//! The HTTP layer only sees the [`Pipeline`] and [`PipelineFactory`] traits.
//!
//! # Examples
//!
//! ```rust,no_run
//! use policy_qa::config::AppConfig;
//! use policy_qa::rag::DocumentPipelineFactory;
//! use policy_qa::rag::PipelineFactory;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let factory = DocumentPipelineFactory::new(&config)?;
//!
//!     let pipeline = factory.build("https://example.com/policy.pdf").await?;
//!     let answer = pipeline.query("What is the deductible?").await?;
//!     println!("Answer: {}", answer.result);
//!
//!     Ok(())
//! }
//! ```

pub mod chunker;
pub mod context;
pub mod index;
pub mod loader;
pub mod pipeline;

use std::sync::Arc;

use async_trait::async_trait;
pub use chunker::Chunker;
pub use context::ContextAssembler;
pub use index::VectorIndex;
pub use loader::DocumentLoader;
pub use pipeline::DocumentPipeline;
pub use pipeline::DocumentPipelineFactory;

use crate::errors::Result;

/// Ordered piece of the source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChunk {
    pub index: usize,
    pub text: String,
}

/// Retrieval hit with its cosine similarity
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Output of a single pipeline query
#[derive(Debug, Clone)]
pub struct QueryAnswer {
    pub result: String,
    pub sources: Vec<ScoredChunk>,
}

impl QueryAnswer {
    /// Answer without retrieval provenance
    pub fn new(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
            sources: Vec::new(),
        }
    }
}

/// Question answering over one already-ingested document
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Answer one natural-language question
    async fn query(&self, question: &str) -> Result<QueryAnswer>;
}

/// Builds a [`Pipeline`] for a document URL; may download and index
#[async_trait]
pub trait PipelineFactory: Send + Sync {
    async fn build(&self, document_url: &str) -> Result<Arc<dyn Pipeline>>;
}
