//! Shared primitives used across the crate.

mod streaming;

pub use streaming::{SseDecoder, SseFrame};
