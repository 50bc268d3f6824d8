//! CLI output formatting utilities
//!
//! This module provides consistent output formatting for the `policy-qa` CLI

use crate::AppConfig;

/// Safely truncate a string at character boundary (not byte boundary)
///
/// # Returns
/// Truncated string with "..." suffix if truncated, otherwise the original string
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Print numbered question/answer pairs
pub fn print_answers(questions: &[String], answers: &[String]) {
    for (i, (question, answer)) in questions.iter().zip(answers).enumerate() {
        println!("❓ {}. {}", i + 1, truncate_str(question, 120));
        println!("💬 {answer}");
        println!();
    }
}

/// Print configuration; pass a redacted copy
pub fn print_config(config: &AppConfig) {
    println!("📋 Policy QA Configuration:");
    println!();

    println!("🌐 Server:");
    println!("  Address: {}:{}", config.server.host, config.server.port);
    println!("  CORS: {}", config.server.enable_cors);
    println!(
        "  API key: {}",
        config.api_key().unwrap_or("(unset, all requests rejected)")
    );
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Directory: {}", config.logging.log_dir);
    println!();

    println!("🧠 Embeddings:");
    println!("  Provider: {:?}", config.embeddings.provider);
    println!("  Endpoint: {}", config.embeddings.endpoint);
    println!("  Model: {}", config.embedding_model());
    println!("  Parallel requests: {}", config.embeddings.parallel_requests);
    println!();

    println!("🤖 LLM:");
    println!("  Provider: {:?}", config.llm.provider);
    println!("  Endpoint: {}", config.llm_endpoint());
    println!("  Model: {}", config.llm_model());
    println!("  Temperature: {}", config.llm.temperature);
    println!("  Max tokens: {}", config.llm.max_tokens);
    println!();

    println!("🔍 Retrieval:");
    println!(
        "  Chunk size: {} (overlap {})",
        config.rag.chunk_size, config.rag.chunk_overlap
    );
    println!("  Top K: {}", config.rag.top_k);
    println!("  Max context: {} chars", config.rag.max_context_length);
    println!("  Max concurrent queries: {}", config.rag.max_concurrent_queries);
    match config.rag.query_timeout_secs {
        Some(secs) => println!("  Query timeout: {secs}s"),
        None => println!("  Query timeout: none"),
    }
    println!("  Fetch timeout: {}s", config.rag.fetch_timeout_secs);
    println!("  Max document size: {} bytes", config.rag.max_document_bytes);
}

pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("❌ {msg}");
}
