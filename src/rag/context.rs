//! Context assembly from retrieved chunks

use super::ScoredChunk;

/// Assembler for creating LLM context from retrieval hits
pub struct ContextAssembler {
    max_context_length: usize,
}

impl ContextAssembler {
    /// Create a new context assembler
    #[must_use]
    pub const fn new(max_context_length: usize) -> Self {
        Self { max_context_length }
    }

    /// Render hits as numbered sections until the length budget is spent.
    ///
    /// The first hit is always included, truncated if it alone exceeds the
    /// budget, so the model never sees an empty context when hits exist.
    #[must_use]
    pub fn assemble(&self, results: &[ScoredChunk]) -> String {
        let mut context = String::new();
        // Budget is in characters, matching the truncation below
        let mut used = 0;

        for (idx, result) in results.iter().enumerate() {
            let entry = format!("\n[Section {}]\n{}\n", idx + 1, result.chunk.text);
            let entry_chars = entry.chars().count();

            if used + entry_chars > self.max_context_length {
                if context.is_empty() {
                    context.push_str(&crate::embeddings::text_preprocessing::smart_truncate_text(
                        &entry,
                        self.max_context_length,
                    ));
                }
                break;
            }

            context.push_str(&entry);
            used += entry_chars;
        }

        context
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(6000)
    }
}
