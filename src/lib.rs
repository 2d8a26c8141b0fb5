//! Vantage - conversational business-analysis assistant
//!
//! Streams model-generated chat turns and renders structured UI cards
//! (stock listings, purchase widgets, event timelines, search-result
//! summaries) as a serializable display tree:
//! - Turn orchestrator over a streamed chat-completion provider
//! - Schema-validated tool handlers with incremental UI fragments
//! - Versioned conversation state with a persistence lifecycle hook

pub mod chat;
pub mod config;
pub mod core;
pub mod persist;
pub mod search;

// Re-export key types for external use
pub use chat::server::{create_router, AppState};
