//! Text preprocessing utilities for embedding generation
//!
//! Provides utilities for cleaning and normalizing document text before it is
//! chunked, and for preparing individual inputs for the embeddings endpoint.

use tracing::debug;
use tracing::warn;

use crate::errors::PolicyQaError;

/// Inputs longer than this are truncated before being embedded
pub const MAX_EMBEDDING_INPUT_CHARS: usize = 8000;

/// Preprocess text for embedding generation
///
/// This function handles:
/// - Normalizing whitespace and newlines
/// - Removing control characters
/// - Truncating overly long inputs at a word boundary
pub fn preprocess_text_for_embedding(text: &str) -> Result<String, PolicyQaError> {
    if text.is_empty() {
        return Err(PolicyQaError::EmbeddingError(
            "Empty text provided".to_string(),
        ));
    }

    let sanitized = sanitize_text(&normalize_whitespace(text));

    if sanitized.is_empty() {
        return Err(PolicyQaError::EmbeddingError(
            "Text contains only whitespace after preprocessing".to_string(),
        ));
    }

    let char_count = sanitized.chars().count();
    if char_count > MAX_EMBEDDING_INPUT_CHARS {
        warn!(
            "Text too long ({} chars), truncating to {}",
            char_count, MAX_EMBEDDING_INPUT_CHARS
        );
        return Ok(smart_truncate_text(&sanitized, MAX_EMBEDDING_INPUT_CHARS));
    }

    debug!(
        "Preprocessed text: {} -> {} chars",
        text.len(),
        sanitized.len()
    );
    Ok(sanitized)
}

/// Clean extracted document text while keeping paragraph breaks.
///
/// Blank lines separate paragraphs; inside a paragraph all whitespace runs
/// collapse to one space. PDF extraction tends to hard-wrap every line, so
/// single newlines are treated as spaces.
pub fn normalize_document(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for line in unified.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
            continue;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs
        .iter()
        .map(|p| sanitize_text(&normalize_whitespace(p)))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Normalize whitespace and newlines
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Sanitize text by replacing control characters
fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Truncate to at most `max_chars` characters, preferring a word boundary
pub fn smart_truncate_text(text: &str, max_chars: usize) -> String {
    let Some((byte_end, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let truncated = &text[..byte_end];
    if let Some(last_space) = truncated.rfind(' ') {
        // Only use word boundary if it's not too far back
        if last_space > byte_end * 3 / 4 {
            return truncated[..last_space].to_string();
        }
    }

    truncated.to_string()
}
