// @awa-component: CHAT-PgConversationStore
//
//! PostgreSQL conversation store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use super::{ConversationStore, StoreError};
use crate::models::{Conversation, Message, Role};
use crate::session::uuidv7;

/// Row returned by conversation queries.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ConversationRow {
    session_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Row returned by message queries.
#[derive(Debug, Clone, sqlx::FromRow)]
struct MessageRow {
    role: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(StoreError::Corrupt)?;
        Ok(Message {
            role,
            content: row.content,
            created_at: row.created_at,
        })
    }
}

/// Conversation store over a shared connection pool.
///
/// The pool is created once by the caller and handed in; the store never
/// opens connections of its own.
#[derive(Debug, Clone)]
pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded migrations from `cern_core/migrations/`.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Get messages for a conversation, ordered by sort_order.
async fn load_messages(
    conn: &mut PgConnection,
    session_id: &str,
) -> Result<Vec<Message>, StoreError> {
    let rows = sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT role, content, created_at
        FROM messages
        WHERE session_id = $1
        ORDER BY sort_order ASC
        "#,
    )
    .bind(session_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(Message::try_from).collect()
}

async fn insert_message(
    conn: &mut PgConnection,
    session_id: &str,
    sort_order: i32,
    message: &Message,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO messages (id, session_id, sort_order, role, content, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(uuidv7())
    .bind(session_id)
    .bind(sort_order)
    .bind(message.role.as_str())
    .bind(&message.content)
    .bind(message.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn find(&self, session_id: &str) -> Result<Option<Conversation>, StoreError> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, ConversationRow>(
            r#"
            SELECT session_id, created_at, updated_at
            FROM conversations
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let messages = load_messages(&mut conn, session_id).await?;
        Ok(Some(Conversation {
            session_id: row.session_id,
            messages,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    async fn append_turn(
        &self,
        session_id: &str,
        user: Message,
        assistant: Message,
    ) -> Result<Conversation, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Create on first reference.
        sqlx::query(
            r#"
            INSERT INTO conversations (session_id)
            VALUES ($1)
            ON CONFLICT (session_id) DO NOTHING
            "#,
        )
        .bind(session_id)
        .execute(&mut *tx)
        .await?;

        // Row lock: concurrent appends to one session queue here.
        sqlx::query("SELECT session_id FROM conversations WHERE session_id = $1 FOR UPDATE")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        let next: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM messages WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_one(&mut *tx)
        .await?;

        insert_message(&mut tx, session_id, next, &user).await?;
        insert_message(&mut tx, session_id, next + 1, &assistant).await?;

        let row = sqlx::query_as::<_, ConversationRow>(
            r#"
            UPDATE conversations
            SET updated_at = now()
            WHERE session_id = $1
            RETURNING session_id, created_at, updated_at
            "#,
        )
        .bind(session_id)
        .fetch_one(&mut *tx)
        .await?;

        let messages = load_messages(&mut tx, session_id).await?;
        tx.commit().await?;

        Ok(Conversation {
            session_id: row.session_id,
            messages,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
