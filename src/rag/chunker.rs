//! Splits normalized document text into overlapping chunks

use text_splitter::Characters;
use text_splitter::ChunkConfig;
use text_splitter::TextSplitter;
use tracing::debug;

use super::DocumentChunk;
use crate::config::RagConfig;
use crate::errors::PolicyQaError;
use crate::errors::Result;

/// Character-based chunker honouring paragraph and sentence boundaries
pub struct Chunker {
    splitter: TextSplitter<Characters>,
}

impl Chunker {
    /// # Errors
    /// `ConfigError` when `overlap >= chunk_size` or `chunk_size == 0`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(PolicyQaError::ConfigError(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(PolicyQaError::ConfigError(format!(
                "chunk overlap ({overlap}) must be smaller than chunk size ({chunk_size})"
            )));
        }

        let config = ChunkConfig::new(chunk_size)
            .with_overlap(overlap)
            .map_err(|e| PolicyQaError::ConfigError(format!("invalid chunk overlap: {e}")))?;

        Ok(Self {
            splitter: TextSplitter::new(config),
        })
    }

    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Chunks in document order, blank chunks dropped
    pub fn split(&self, text: &str) -> Vec<DocumentChunk> {
        let chunks: Vec<DocumentChunk> = self
            .splitter
            .chunks(text)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .enumerate()
            .map(|(index, c)| DocumentChunk {
                index,
                text: c.to_string(),
            })
            .collect();

        debug!("Split {} chars into {} chunks", text.len(), chunks.len());
        chunks
    }
}
