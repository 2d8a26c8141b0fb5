//! Conversation state store.
//!
//! Each chat session owns one `StateHandle`: a versioned, staged snapshot
//! of the durable log. Mutations are staged through `update` (full
//! replacement, last write wins) and become visible to persistence only
//! through `done`, which fires the lifecycle hook: check the session, and
//! when one is present, save the chat record fire-and-forget.
//!
//! Only one turn may be in flight per session; the orchestrator holds
//! `lock_turn` for the duration of a turn.

use chrono::Utc;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use super::types::{AiState, ChatRecord, Message, MessageContent};
use crate::persist::{ChatStore, SessionProvider};

/// Title length cap, in characters of the first message's text.
const TITLE_CHARS: usize = 100;

struct Staged {
    state: AiState,
    version: u64,
    /// Established by the first `done` and never rewritten.
    title: Option<String>,
}

struct StateInner {
    staged: StdMutex<Staged>,
    turn_lock: Mutex<()>,
    store: Arc<dyn ChatStore>,
    sessions: Arc<dyn SessionProvider>,
}

/// Session-scoped handle with controlled read and staged-write access.
#[derive(Clone)]
pub struct StateHandle {
    inner: Arc<StateInner>,
}

impl StateHandle {
    pub fn new(
        state: AiState,
        store: Arc<dyn ChatStore>,
        sessions: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(StateInner {
                staged: StdMutex::new(Staged {
                    state,
                    version: 0,
                    title: None,
                }),
                turn_lock: Mutex::new(()),
                store,
                sessions,
            }),
        }
    }

    pub fn chat_id(&self) -> String {
        self.inner.staged.lock().unwrap().state.chat_id.clone()
    }

    /// Current staged snapshot.
    pub fn get(&self) -> AiState {
        self.inner.staged.lock().unwrap().state.clone()
    }

    pub fn version(&self) -> u64 {
        self.inner.staged.lock().unwrap().version
    }

    /// Stage a full replacement of the snapshot.
    pub fn update(&self, next: AiState) {
        let mut staged = self.inner.staged.lock().unwrap();
        staged.state = next;
        staged.version += 1;
    }

    /// Stage the final snapshot for the turn and fire the lifecycle hook.
    ///
    /// The first call establishes the chat title from the first message's
    /// leading text. Persistence is skipped silently without a session;
    /// save failures are logged, never propagated.
    pub async fn done(&self, final_state: AiState) {
        let (title, state) = {
            let mut staged = self.inner.staged.lock().unwrap();
            staged.state = final_state;
            staged.version += 1;
            if staged.title.is_none() {
                staged.title = staged.state.messages.first().map(leading_text);
            }
            (
                staged.title.clone().unwrap_or_default(),
                staged.state.clone(),
            )
        };

        let Some(session) = self.inner.sessions.auth().await else {
            debug!(chat = %state.chat_id, "no session, skipping chat save");
            return;
        };

        let record = ChatRecord {
            id: state.chat_id.clone(),
            title,
            user_id: session.user_id,
            created_at: Utc::now(),
            path: format!("/chat/{}", state.chat_id),
            messages: state.messages,
        };

        if let Err(e) = self.inner.store.save_chat(&record).await {
            warn!(chat = %record.id, error = %e, "failed to save chat");
        }
    }

    /// Serialize turns within this session.
    pub async fn lock_turn(&self) -> MutexGuard<'_, ()> {
        self.inner.turn_lock.lock().await
    }
}

fn leading_text(message: &Message) -> String {
    match &message.content {
        MessageContent::Text(text) => text.chars().take(TITLE_CHARS).collect(),
        MessageContent::Parts(_) => String::new(),
    }
}
