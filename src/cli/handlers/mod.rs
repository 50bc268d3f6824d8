//! CLI command handlers module
//!
//! - serve: API server
//! - ask: One-shot question answering
//! - info: Configuration display

pub mod ask;
pub mod info;
pub mod serve;

// Re-export all public handlers
pub use ask::*;
pub use info::*;
pub use serve::*;
