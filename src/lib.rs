//! Question answering over remote policy documents
//!
//! A client posts a document URL and a list of questions; the service
//! downloads and indexes the document once, answers every question
//! concurrently, and returns the answers in question order.
//!
//! - [`rag`]: document loading, chunking, retrieval and answer generation
//! - [`api`]: the authenticated HTTP surface and the per-document pipeline cache
//! - [`cli`]: the `policy-qa` binary's commands

pub mod api;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod rag;


pub use config::AppConfig;
pub use errors::*;
