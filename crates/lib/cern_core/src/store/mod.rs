//! Conversation persistence.
//!
//! [`ConversationStore`] is the seam between the turn service and storage.
//! Two implementations ship: [`PgConversationStore`] for PostgreSQL and
//! [`MemoryConversationStore`] for tests and throwaway runs.

mod memory;
mod postgres;

pub use memory::MemoryConversationStore;
pub use postgres::PgConversationStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Conversation, Message};

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Append-only transcript storage keyed by session id.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Load a conversation by exact session id.
    async fn find(&self, session_id: &str) -> Result<Option<Conversation>, StoreError>;

    /// Atomically append one turn, creating the conversation if it does not
    /// exist yet. Either both messages are stored or neither is.
    ///
    /// Returns the conversation as it stands after the append.
    async fn append_turn(
        &self,
        session_id: &str,
        user: Message,
        assistant: Message,
    ) -> Result<Conversation, StoreError>;
}
