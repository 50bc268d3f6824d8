//! Complete RAG pipeline: Load -> Chunk -> Embed -> Index, then Retrieve -> Generate

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use tracing::info;

use super::Chunker;
use super::ContextAssembler;
use super::DocumentLoader;
use super::Pipeline;
use super::PipelineFactory;
use super::QueryAnswer;
use super::VectorIndex;
use crate::config::AppConfig;
use crate::embeddings::Embedder;
use crate::embeddings::EmbeddingService;
use crate::errors::PolicyQaError;
use crate::errors::Result;
use crate::llm::LlmService;
use crate::llm::PromptTemplate;
use crate::llm::RagPrompts;
use crate::llm::TextGenerator;

/// Reply for a blank question; there is nothing to retrieve for it
pub const BLANK_QUESTION_ANSWER: &str =
    "No question was asked, so the document does not specify an answer.";

/// Retrieval knobs shared by every pipeline a factory builds
#[derive(Debug, Clone, Copy)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub max_context_length: usize,
}

impl RetrievalSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.rag.top_k,
            max_context_length: config.rag.max_context_length,
        }
    }
}

/// Pipeline over a single ingested document
pub struct DocumentPipeline {
    document_url: String,
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn TextGenerator>,
    context_assembler: ContextAssembler,
    prompt: PromptTemplate,
    top_k: usize,
}

impl DocumentPipeline {
    /// Chunk, embed and index already-extracted document text
    ///
    /// # Errors
    /// - `PipelineError` when the text yields no chunks or the index rejects the embeddings
    /// - Embedding errors from the provider
    pub async fn from_text(
        document_url: &str,
        text: &str,
        chunker: &Chunker,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        settings: RetrievalSettings,
    ) -> Result<Self> {
        let chunks = chunker.split(text);
        if chunks.is_empty() {
            return Err(PolicyQaError::PipelineError(format!(
                "{document_url}: document produced no chunks"
            )));
        }

        debug!("Embedding {} chunks for {}", chunks.len(), document_url);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        let index = VectorIndex::new(chunks, embeddings)?;

        info!(
            "Indexed {} chunks ({} dims) for {}",
            index.len(),
            index.dimension(),
            document_url
        );

        Ok(Self {
            document_url: document_url.to_string(),
            index,
            embedder,
            generator,
            context_assembler: ContextAssembler::new(settings.max_context_length),
            prompt: RagPrompts::document_qa(),
            top_k: settings.top_k,
        })
    }

    async fn answer(&self, question: &str) -> Result<QueryAnswer> {
        debug!("Step 1: Embedding question");
        let query_embedding = self.embedder.embed(question).await?;

        debug!("Step 2: Retrieving top {} chunks", self.top_k);
        let sources = self.index.search(&query_embedding, self.top_k)?;

        debug!("Step 3: Assembling context from {} chunks", sources.len());
        let context = self.context_assembler.assemble(&sources);

        debug!("Step 4: Generating answer");
        let prompt = self.prompt.render(&HashMap::from([
            ("context", context.as_str()),
            ("question", question),
        ]));
        let result = self.generator.generate(&prompt).await?;

        Ok(QueryAnswer { result, sources })
    }

    pub fn document_url(&self) -> &str {
        &self.document_url
    }

    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }
}

#[async_trait]
impl Pipeline for DocumentPipeline {
    async fn query(&self, question: &str) -> Result<QueryAnswer> {
        let question = question.trim();
        if question.is_empty() {
            debug!("Blank question, answering without retrieval");
            return Ok(QueryAnswer::new(BLANK_QUESTION_ANSWER));
        }

        self.answer(question).await.map_err(|e| match e {
            PolicyQaError::QueryError(_) => e,
            other => PolicyQaError::QueryError(format!("{} ({})", other, other.kind())),
        })
    }
}

/// Builds [`DocumentPipeline`]s from document URLs
pub struct DocumentPipelineFactory {
    loader: DocumentLoader,
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn TextGenerator>,
    settings: RetrievalSettings,
}

impl DocumentPipelineFactory {
    /// Wire up the configured embedding and LLM providers
    pub fn new(config: &AppConfig) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingService::new(config)?);
        let generator: Arc<dyn TextGenerator> = Arc::new(LlmService::new(config)?);

        Ok(Self::with_services(
            DocumentLoader::from_config(config)?,
            Chunker::from_config(&config.rag)?,
            embedder,
            generator,
            RetrievalSettings::from_config(config),
        ))
    }

    /// Create from existing services
    #[must_use]
    pub fn with_services(
        loader: DocumentLoader,
        chunker: Chunker,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            loader,
            chunker,
            embedder,
            generator,
            settings,
        }
    }
}

#[async_trait]
impl PipelineFactory for DocumentPipelineFactory {
    async fn build(&self, document_url: &str) -> Result<Arc<dyn Pipeline>> {
        info!("Building pipeline for {}", document_url);
        let text = self.loader.load(document_url).await?;

        let pipeline = DocumentPipeline::from_text(
            document_url,
            &text,
            &self.chunker,
            Arc::clone(&self.embedder),
            Arc::clone(&self.generator),
            self.settings,
        )
        .await?;

        Ok(Arc::new(pipeline))
    }
}
