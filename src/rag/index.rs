//! In-memory vector index over one document's chunks

use std::cmp::Ordering;

use super::DocumentChunk;
use super::ScoredChunk;
use crate::errors::PolicyQaError;
use crate::errors::Result;

/// Brute-force cosine index; documents are small enough that a scan wins
#[derive(Debug)]
pub struct VectorIndex {
    chunks: Vec<DocumentChunk>,
    embeddings: Vec<Vec<f32>>,
    dimension: usize,
}

impl VectorIndex {
    /// # Errors
    /// `PipelineError` on count or dimension mismatch, or an empty index.
    pub fn new(chunks: Vec<DocumentChunk>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(PolicyQaError::PipelineError(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let Some(dimension) = embeddings.first().map(Vec::len) else {
            return Err(PolicyQaError::PipelineError(
                "Cannot build an index without chunks".to_string(),
            ));
        };

        if let Some(pos) = embeddings.iter().position(|e| e.len() != dimension) {
            return Err(PolicyQaError::PipelineError(format!(
                "Embedding {pos} has dimension {}, expected {dimension}",
                embeddings[pos].len()
            )));
        }

        Ok(Self {
            chunks,
            embeddings,
            dimension,
        })
    }

    /// Top `k` chunks by descending similarity; ties keep document order
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.dimension {
            return Err(PolicyQaError::QueryError(format!(
                "Query embedding has dimension {}, index expects {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query, e)))
            .collect();

        // Stable sort keeps the original index order for equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub const fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Cosine similarity; zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f32, 0.0_f32, 0.0_f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
