//! Turn orchestrator: one streamed model turn per user submission.
//!
//! A turn appends the user message, opens the completion stream, and then
//! either accumulates text into a bot bubble or hands the turn to a tool
//! handler. The caller gets a `TurnHandle` as soon as the first fragment
//! exists; later fragments overwrite the same display slot.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use super::prompts::{ANALYST_SYSTEM_PROMPT, TRADING_SYSTEM_PROMPT};
use super::provider::{
    ChatRequest, MessageRole, Provider, ProviderMessage, StreamEvent, ToolDefinition,
};
use super::render::Display;
use super::state::StateHandle;
use super::tools::{Pacing, ToolContext, ToolInvocation, analyst_tools, trading_tools};
use super::types::{AiState, ContentPart, Message, MessageContent, Role, new_id};
use crate::config::MissingModel;
use crate::persist::{ChatStore, SessionProvider};
use crate::search::SearchClient;

/// Orchestration entry point. The two personas are mutually exclusive per
/// request: each carries its own system instruction and tool set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    /// Business case analysis with the search tool.
    Analyst,
    /// Demo stock-trading bot with the card tools.
    Trading,
}

impl Persona {
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Persona::Analyst => ANALYST_SYSTEM_PROMPT,
            Persona::Trading => TRADING_SYSTEM_PROMPT,
        }
    }

    pub fn tools(&self) -> Vec<ToolDefinition> {
        match self {
            Persona::Analyst => analyst_tools(),
            Persona::Trading => trading_tools(),
        }
    }
}

/// Single-slot overwritable display channel: consumers always see the
/// last written fragment.
#[derive(Clone)]
pub struct UiSender {
    tx: watch::Sender<Display>,
}

impl UiSender {
    pub fn send(&self, display: Display) {
        // A send only fails when every receiver is gone; the fragment is
        // then simply unobserved.
        let _ = self.tx.send(display);
    }
}

/// Handle returned to the caller as soon as the first fragment exists.
#[derive(Debug)]
pub struct TurnHandle {
    /// Id of the new UI entry.
    pub id: String,
    /// Current-value display stream; the last write is what renders.
    pub display: watch::Receiver<Display>,
    /// The running turn. Stream errors surface here, nowhere else.
    pub task: JoinHandle<Result<()>>,
}

impl TurnHandle {
    /// Await turn completion and return the final fragment.
    pub async fn finish(self) -> Result<Display> {
        self.task.await.context("turn task panicked")??;
        Ok(self.display.borrow().clone())
    }
}

/// One chat session: the state handle plus the collaborators a turn needs.
pub struct ChatSession {
    state: StateHandle,
    provider: Arc<dyn Provider>,
    search: Arc<SearchClient>,
    model: Option<String>,
    pacing: Pacing,
}

impl ChatSession {
    pub fn new(
        state: StateHandle,
        provider: Arc<dyn Provider>,
        search: Arc<SearchClient>,
        model: Option<String>,
        pacing: Pacing,
    ) -> Self {
        Self {
            state,
            provider,
            search,
            model,
            pacing,
        }
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    /// Drive one turn for the given user text.
    ///
    /// Fails fast when no model is configured - nothing is appended and no
    /// turn starts. After that, errors surface only through the task
    /// handle on `TurnHandle`.
    pub fn submit_user_message(
        &self,
        content: &str,
        persona: Persona,
    ) -> Result<TurnHandle, MissingModel> {
        let model = self.model.clone().ok_or(MissingModel)?;

        let mut state = self.state.get();
        state.messages.push(Message::user(content));
        self.state.update(state);

        let (tx, rx) = watch::channel(Display::Spinner);

        let turn = Turn {
            state: self.state.clone(),
            provider: self.provider.clone(),
            search: self.search.clone(),
            model,
            pacing: self.pacing,
            persona,
            ui: UiSender { tx },
        };
        let task = tokio::spawn(turn.run());

        Ok(TurnHandle {
            id: new_id(),
            display: rx,
            task,
        })
    }
}

struct Turn {
    state: StateHandle,
    provider: Arc<dyn Provider>,
    search: Arc<SearchClient>,
    model: String,
    pacing: Pacing,
    persona: Persona,
    ui: UiSender,
}

impl Turn {
    async fn run(self) -> Result<()> {
        let _guard = self.state.lock_turn().await;

        let request = ChatRequest::new(self.model.clone(), self.persona.system_prompt())
            .with_messages(provider_messages(&self.state.get()))
            .with_tools(self.persona.tools());

        let mut rx = self.provider.create_stream(request).await?;

        // In-flight tool call accumulation: call_id -> (name, raw args)
        let mut pending_calls: HashMap<String, (String, String)> = HashMap::new();
        // Created lazily on the first text delta
        let mut accumulated_text: Option<String> = None;
        let mut invocation: Option<ToolInvocation> = None;

        while let Some(event) = rx.recv().await {
            match event {
                StreamEvent::TextDelta(delta) => {
                    let text = accumulated_text.get_or_insert_with(String::new);
                    text.push_str(&delta);
                    self.ui.send(Display::BotMessage { text: text.clone() });
                }
                StreamEvent::FunctionCallStart { call_id, name } => {
                    debug!(tool = %name, "model requested tool");
                    pending_calls.insert(call_id, (name, String::new()));
                }
                StreamEvent::FunctionCallDelta {
                    call_id,
                    arguments_delta,
                } => {
                    if let Some((_, args)) = pending_calls.get_mut(&call_id) {
                        args.push_str(&arguments_delta);
                    }
                }
                StreamEvent::FunctionCallEnd { call_id } => {
                    if let Some((name, raw_args)) = pending_calls.remove(&call_id) {
                        let args = serde_json::from_str(&raw_args).unwrap_or_else(|_| json!({}));
                        invocation = Some(ToolInvocation::parse(&name, args)?);
                        // The handler owns the turn's output from here on
                        break;
                    }
                }
                StreamEvent::Usage(usage) => {
                    debug!(
                        input_tokens = usage.input_tokens,
                        output_tokens = usage.output_tokens,
                        "completion usage"
                    );
                }
                StreamEvent::Error(message) => {
                    anyhow::bail!("completion stream error: {message}");
                }
                StreamEvent::Done => break,
            }
        }

        if let Some(invocation) = invocation {
            let ctx = ToolContext {
                ui: self.ui.clone(),
                state: self.state.clone(),
                search: self.search.clone(),
                provider: self.provider.clone(),
                model: self.model.clone(),
                pacing: self.pacing,
            };
            return ctx.execute(invocation).await;
        }

        if let Some(text) = accumulated_text {
            let mut state = self.state.get();
            state.messages.push(Message::assistant_text(&text));
            self.state.done(state).await;
        }

        Ok(())
    }
}

/// Map the durable log to wire form: `{role, content, name}` per entry.
/// Tool-bearing entries are flattened to bracketed text, since the wire
/// provider speaks plain content.
fn provider_messages(state: &AiState) -> Vec<ProviderMessage> {
    state
        .messages
        .iter()
        .map(|message| {
            let role = match message.role {
                Role::User | Role::Tool => MessageRole::User,
                Role::Assistant => MessageRole::Assistant,
                Role::System => MessageRole::System,
            };
            let content = match &message.content {
                MessageContent::Text(text) => text.clone(),
                MessageContent::Parts(parts) => parts
                    .iter()
                    .map(|part| match part {
                        ContentPart::ToolCall { tool_name, .. } => {
                            format!("[Called {} tool]", tool_name)
                        }
                        ContentPart::ToolResult {
                            tool_name, result, ..
                        } => format!("[{} result]: {}", tool_name, result),
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
            };
            ProviderMessage {
                role,
                content,
                name: message.name.clone(),
            }
        })
        .collect()
}

/// Session registry: one `ChatSession` per chat id, created on demand.
pub struct Sessions {
    inner: RwLock<HashMap<String, Arc<ChatSession>>>,
    provider: Arc<dyn Provider>,
    search: Arc<SearchClient>,
    store: Arc<dyn ChatStore>,
    auth: Arc<dyn SessionProvider>,
    model: Option<String>,
    pacing: Pacing,
}

impl Sessions {
    pub fn new(
        provider: Arc<dyn Provider>,
        search: Arc<SearchClient>,
        store: Arc<dyn ChatStore>,
        auth: Arc<dyn SessionProvider>,
        model: Option<String>,
        pacing: Pacing,
    ) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            provider,
            search,
            store,
            auth,
            model,
            pacing,
        }
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Look up an existing session.
    pub async fn get(&self, chat_id: &str) -> Option<Arc<ChatSession>> {
        self.inner.read().await.get(chat_id).cloned()
    }

    /// Get or create the session for a chat id; `None` starts a fresh chat.
    pub async fn get_or_create(&self, chat_id: Option<&str>) -> Arc<ChatSession> {
        let chat_id = chat_id.map(str::to_string).unwrap_or_else(new_id);

        // Fast path: session already exists
        {
            let sessions = self.inner.read().await;
            if let Some(session) = sessions.get(&chat_id) {
                return session.clone();
            }
        }

        let mut sessions = self.inner.write().await;
        sessions
            .entry(chat_id.clone())
            .or_insert_with(|| {
                let state = StateHandle::new(
                    AiState::with_chat_id(chat_id),
                    self.store.clone(),
                    self.auth.clone(),
                );
                Arc::new(ChatSession::new(
                    state,
                    self.provider.clone(),
                    self.search.clone(),
                    self.model.clone(),
                    self.pacing,
                ))
            })
            .clone()
    }
}
