//! In-process conversation store backed by a concurrent map.

use async_trait::async_trait;
use dashmap::DashMap;

use super::{ConversationStore, StoreError};
use crate::models::{Conversation, Message};

/// Keeps every conversation in memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    conversations: DashMap<String, Conversation>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations.
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn find(&self, session_id: &str) -> Result<Option<Conversation>, StoreError> {
        Ok(self
            .conversations
            .get(session_id)
            .map(|entry| entry.value().clone()))
    }

    async fn append_turn(
        &self,
        session_id: &str,
        user: Message,
        assistant: Message,
    ) -> Result<Conversation, StoreError> {
        // The entry guard holds the shard lock, so the append is atomic per key.
        let mut entry = self
            .conversations
            .entry(session_id.to_string())
            .or_insert_with(|| Conversation::new(session_id));
        entry.push_turn(user, assistant);
        Ok(entry.value().clone())
    }
}
