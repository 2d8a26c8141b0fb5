//! Durable message-log types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Opaque unique id for messages, chats, and tool calls.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Role of one turn unit in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
            Role::System => "system",
        }
    }
}

/// Structured entry inside an assistant or tool message.
///
/// A tool-call and its tool-result share the same `toolCallId`; a result
/// never appears without a preceding call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "tool-call")]
    ToolCall {
        #[serde(rename = "toolName")]
        tool_name: String,
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        args: Value,
    },
    #[serde(rename = "tool-result")]
    ToolResult {
        #[serde(rename = "toolName")]
        tool_name: String,
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        result: Value,
    },
}

/// Message content: plain text, or an ordered sequence of structured parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            MessageContent::Parts(_) => None,
        }
    }
}

/// One turn unit in the durable log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: MessageContent,
    /// Optional display name override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role: Role::User,
            content: MessageContent::Text(text.into()),
            name: None,
        }
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
            name: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role: Role::System,
            content: MessageContent::Text(text.into()),
            name: None,
        }
    }

    /// Build the paired tool-call / tool-result messages for one completed
    /// tool invocation. Both parts share a fresh `toolCallId`.
    pub fn tool_exchange(tool_name: &str, args: Value, result: Value) -> (Self, Self) {
        let tool_call_id = new_id();
        let call = Self {
            id: new_id(),
            role: Role::Assistant,
            content: MessageContent::Parts(vec![ContentPart::ToolCall {
                tool_name: tool_name.to_string(),
                tool_call_id: tool_call_id.clone(),
                args,
            }]),
            name: None,
        };
        let result = Self {
            id: new_id(),
            role: Role::Tool,
            content: MessageContent::Parts(vec![ContentPart::ToolResult {
                tool_name: tool_name.to_string(),
                tool_call_id,
                result,
            }]),
            name: None,
        };
        (call, result)
    }
}

/// Durable conversation state: chat id plus ordered message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiState {
    pub chat_id: String,
    pub messages: Vec<Message>,
}

impl AiState {
    pub fn new() -> Self {
        Self::with_chat_id(new_id())
    }

    pub fn with_chat_id(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            messages: Vec::new(),
        }
    }
}

impl Default for AiState {
    fn default() -> Self {
        Self::new()
    }
}

/// Persisted chat record, built once per finalized turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: String,
    pub title: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
    pub path: String,
}
