//! External collaborator interfaces: session lookup and chat persistence.
//!
//! Both are black boxes to the chat core; the traits here are the narrow
//! seams it consumes them through.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::chat::types::ChatRecord;

/// Authenticated session, as reported by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The current session, or `None` when unauthenticated.
    async fn auth(&self) -> Option<Session>;
}

/// Session sourced from configuration; unset means unauthenticated.
pub struct EnvSessionProvider {
    user_id: Option<String>,
}

impl EnvSessionProvider {
    pub fn new(user_id: Option<String>) -> Self {
        Self { user_id }
    }
}

#[async_trait]
impl SessionProvider for EnvSessionProvider {
    async fn auth(&self) -> Option<Session> {
        self.user_id.clone().map(|user_id| Session { user_id })
    }
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Create or overwrite the chat record for a finalized turn.
    async fn save_chat(&self, chat: &ChatRecord) -> anyhow::Result<()>;
}

/// In-process store backing development runs and tests.
#[derive(Default)]
pub struct MemoryChatStore {
    chats: RwLock<HashMap<String, ChatRecord>>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<ChatRecord> {
        self.chats.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.chats.read().await.len()
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn save_chat(&self, chat: &ChatRecord) -> anyhow::Result<()> {
        self.chats
            .write()
            .await
            .insert(chat.id.clone(), chat.clone());
        Ok(())
    }
}
