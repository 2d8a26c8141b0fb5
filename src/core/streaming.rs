//! SSE (Server-Sent Events) stream decoding.
//!
//! The model provider receives chat completions as an SSE byte stream;
//! chunks arrive at arbitrary boundaries, so frames have to be reassembled
//! from a buffer before they can be parsed.

use serde::de::DeserializeOwned;

/// Buffered SSE decoder: push raw chunks, get back complete `data:` frames.
///
/// The buffer is bounded so a malformed stream cannot grow it without limit.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    /// Upper bound on buffered bytes before the oldest half is discarded.
    const MAX_BUFFER_BYTES: usize = 1024 * 1024;

    pub fn new() -> Self {
        Self::default()
    }

    /// Push a chunk of bytes and extract every complete frame.
    ///
    /// Incomplete trailing data stays buffered for the next push.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        if self.buffer.len() > Self::MAX_BUFFER_BYTES {
            tracing::warn!(
                "SSE buffer exceeded {} bytes, dropping oldest half",
                Self::MAX_BUFFER_BYTES
            );
            let mut keep_from = self.buffer.len() - Self::MAX_BUFFER_BYTES / 2;
            while !self.buffer.is_char_boundary(keep_from) {
                keep_from += 1;
            }
            self.buffer.drain(..keep_from);
        }

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let rest = self.buffer.split_off(pos + 1);
            let line = std::mem::replace(&mut self.buffer, rest);
            let line = line.trim();

            // Only data lines matter for chat completions; event:/id:/retry:
            // lines and blank separators are skipped.
            if let Some(data) = line.strip_prefix("data: ") {
                frames.push(SseFrame {
                    data: data.to_string(),
                });
            }
        }

        frames
    }

    /// Push a string directly (used by tests).
    pub fn push_str(&mut self, s: &str) -> Vec<SseFrame> {
        self.push(s.as_bytes())
    }

    /// Whether incomplete data is still buffered.
    pub fn has_remaining(&self) -> bool {
        !self.buffer.is_empty()
    }
}

/// One complete `data:` frame, prefix stripped.
#[derive(Debug, Clone)]
pub struct SseFrame {
    pub data: String,
}

impl SseFrame {
    /// The `[DONE]` stream terminator.
    pub fn is_done(&self) -> bool {
        self.data == "[DONE]"
    }

    /// Parse the frame as JSON, returning `None` on mismatch.
    pub fn try_parse<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_str(&self.data).ok()
    }
}
