//! Provider abstraction for streamed chat completions.
//!
//! The orchestrator consumes a unified event stream; the wire details
//! (OpenAI-compatible SSE) live in the implementation.

mod openai;

pub use openai::OpenAiProvider;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

/// Role of a history entry in provider wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        }
    }
}

/// One history entry sent to the model.
#[derive(Debug, Clone)]
pub struct ProviderMessage {
    pub role: MessageRole,
    pub content: String,
    /// Optional display name override, forwarded when present.
    pub name: Option<String>,
}

/// Tool made available to the model for this request.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// One streamed completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub messages: Vec<ProviderMessage>,
    pub tools: Vec<ToolDefinition>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, system: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            messages: Vec::new(),
            tools: Vec::new(),
            max_tokens: None,
        }
    }

    pub fn with_messages(mut self, messages: Vec<ProviderMessage>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}

/// Token accounting reported at the end of a stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Incremental events from a streamed completion.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Text delta - applied in arrival order
    TextDelta(String),

    /// Tool call opened; arguments follow as deltas
    FunctionCallStart { call_id: String, name: String },

    /// Tool call arguments chunk
    FunctionCallDelta {
        call_id: String,
        arguments_delta: String,
    },

    /// Tool call arguments complete - ready to execute
    FunctionCallEnd { call_id: String },

    /// Token usage, when the backend reports it
    Usage(Usage),

    /// Stream failed
    Error(String),

    /// Stream completed
    Done,
}

/// Unified provider trait for streamed LLM backends
#[async_trait]
pub trait Provider: Send + Sync {
    /// Create a streaming chat completion
    async fn create_stream(&self, request: ChatRequest) -> Result<mpsc::Receiver<StreamEvent>>;

    /// Get the provider name for logging
    fn name(&self) -> &'static str;
}
