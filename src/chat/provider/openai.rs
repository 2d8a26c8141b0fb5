//! OpenAI-compatible provider (Chat Completions API).
//!
//! Works against any endpoint speaking the OpenAI chat-completions SSE
//! protocol; base URL, API key and model come from configuration. Uses
//! `core::SseDecoder` for SSE stream parsing.

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::mpsc;

use super::{ChatRequest, Provider, StreamEvent, ToolDefinition, Usage};
use crate::core::SseDecoder;

/// Provider for OpenAI-compatible chat-completions endpoints
pub struct OpenAiProvider {
    client: HttpClient,
    endpoint: String,
    api_key: String,
}

impl OpenAiProvider {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            client: HttpClient::new(),
            endpoint: format!(
                "{}/v1/chat/completions",
                base_url.trim_end_matches('/')
            ),
            api_key: api_key.into(),
        }
    }

    /// Build the wire message list: system instruction first, then history.
    fn build_messages(request: &ChatRequest) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        messages.push(WireMessage {
            role: "system".into(),
            content: request.system.clone(),
            name: None,
        });

        for msg in &request.messages {
            messages.push(WireMessage {
                role: msg.role.as_str().into(),
                content: msg.content.clone(),
                name: msg.name.clone(),
            });
        }

        messages
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Vec<WireTool> {
        tools
            .iter()
            .map(|t| WireTool {
                tool_type: "function".into(),
                function: WireFunction {
                    name: t.name.clone(),
                    description: Some(t.description.clone()),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    /// Process the SSE response body and forward events to the channel.
    ///
    /// Tool calls may stream interleaved; they are tracked by index until
    /// both id and name are known, then emitted as start/delta/end.
    async fn process_sse_stream(response: reqwest::Response, tx: mpsc::Sender<StreamEvent>) {
        struct InFlightCall {
            id: String,
            name: String,
            started: bool,
        }

        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut tool_calls: HashMap<usize, InFlightCall> = HashMap::new();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                    break;
                }
            };

            for frame in decoder.push(&chunk) {
                if frame.is_done() {
                    continue;
                }

                let chunk_data: WireStreamChunk = match frame.try_parse() {
                    Some(c) => c,
                    None => continue,
                };

                for choice in chunk_data.choices {
                    let delta = choice.delta;

                    if let Some(content) = delta.content {
                        if !content.is_empty() {
                            let _ = tx.send(StreamEvent::TextDelta(content)).await;
                        }
                    }

                    if let Some(delta_tool_calls) = delta.tool_calls {
                        for tc in delta_tool_calls {
                            let call = tool_calls.entry(tc.index).or_insert_with(|| {
                                InFlightCall {
                                    id: String::new(),
                                    name: String::new(),
                                    started: false,
                                }
                            });

                            if let Some(ref id) = tc.id {
                                call.id = id.clone();
                            }
                            if let Some(ref func) = tc.function {
                                if let Some(ref name) = func.name {
                                    call.name = name.clone();
                                }
                            }

                            // Emit the start once both id and name are known
                            if !call.started && !call.id.is_empty() && !call.name.is_empty() {
                                call.started = true;
                                let _ = tx
                                    .send(StreamEvent::FunctionCallStart {
                                        call_id: call.id.clone(),
                                        name: call.name.clone(),
                                    })
                                    .await;
                            }

                            if let Some(ref func) = tc.function {
                                if let Some(ref args) = func.arguments {
                                    if !args.is_empty() && call.started {
                                        let _ = tx
                                            .send(StreamEvent::FunctionCallDelta {
                                                call_id: call.id.clone(),
                                                arguments_delta: args.clone(),
                                            })
                                            .await;
                                    }
                                }
                            }
                        }
                    }

                    // Close out every pending call when the choice finishes
                    if choice.finish_reason.is_some() {
                        for (_, call) in tool_calls.drain() {
                            if call.started {
                                let _ = tx
                                    .send(StreamEvent::FunctionCallEnd { call_id: call.id })
                                    .await;
                            }
                        }
                    }
                }

                if let Some(usage) = chunk_data.usage {
                    let _ = tx
                        .send(StreamEvent::Usage(Usage {
                            input_tokens: usage.prompt_tokens,
                            output_tokens: usage.completion_tokens,
                        }))
                        .await;
                }
            }
        }

        let _ = tx.send(StreamEvent::Done).await;
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn create_stream(&self, request: ChatRequest) -> Result<mpsc::Receiver<StreamEvent>> {
        let messages = Self::build_messages(&request);
        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(Self::convert_tools(&request.tools))
        };

        let body = CompletionRequest {
            model: request.model.clone(),
            messages,
            tools,
            stream: true,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|e| format!("(failed to read body: {})", e));
            anyhow::bail!("completion API error {}: {}", status, text);
        }

        let (tx, rx) = mpsc::channel(100);
        tokio::spawn(Self::process_sse_stream(response, tx));

        Ok(rx)
    }
}

// ============================================================================
// Wire types (OpenAI-compatible Chat Completions format)
// ============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WireStreamChunk {
    choices: Vec<WireStreamChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireStreamChoice {
    delta: WireStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct WireStreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<WireStreamToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireStreamToolCall {
    #[serde(default)]
    index: usize,
    id: Option<String>,
    function: Option<WireStreamFunction>,
}

#[derive(Debug, Deserialize)]
struct WireStreamFunction {
    name: Option<String>,
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
