// @awa-component: CHAT-TurnService
//
//! The turn handler: resolve a session, record one exchange, return the reply.

use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::models::Message;
use crate::reply::{ReplyError, ReplyGenerator};
use crate::session::{new_session_id, supplied_session_id};
use crate::store::{ConversationStore, StoreError};

/// Turn handling errors.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Reply(#[from] ReplyError),
}

/// Result of one recorded turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub reply: String,
    pub explanation: String,
    /// Canonical session id the client should send next time.
    pub session_id: String,
    /// Length of the transcript after this turn.
    pub message_count: usize,
}

/// Per-session async mutexes.
///
/// An entry lives only while some request holds or waits on it.
#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

type Acquire = Pin<Box<dyn Future<Output = OwnedMutexGuard<()>> + Send>>;

enum Slot {
    Waiting(Acquire),
    Held { _lock: OwnedMutexGuard<()> },
    Released,
}

/// Held for the duration of one turn; releases and prunes on drop.
///
/// The guard exists from the moment a request starts waiting, so a request
/// cancelled while queued still prunes its entry.
pub struct SessionGuard<'a> {
    locks: &'a SessionLocks,
    session_id: String,
    slot: Slot,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `session_id`.
    pub async fn lock(&self, session_id: &str) -> SessionGuard<'_> {
        let mutex = self
            .locks
            .entry(session_id.to_string())
            .or_default()
            .clone();
        let mut guard = SessionGuard {
            locks: self,
            session_id: session_id.to_string(),
            slot: Slot::Waiting(Box::pin(mutex.lock_owned())),
        };
        if let Slot::Waiting(acquire) = &mut guard.slot {
            let lock = acquire.await;
            guard.slot = Slot::Held { _lock: lock };
        }
        guard
    }

    /// Number of sessions with a live lock entry.
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        // Give up the lock or the place in the queue before counting handles.
        self.slot = Slot::Released;
        // Only the map's own handle left means nobody is holding or waiting.
        self.locks
            .locks
            .remove_if(&self.session_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Create-or-resume turn handling over an injected store and reply generator.
pub struct ConversationService {
    store: Arc<dyn ConversationStore>,
    replies: Arc<dyn ReplyGenerator>,
    locks: SessionLocks,
}

impl ConversationService {
    pub fn new(store: Arc<dyn ConversationStore>, replies: Arc<dyn ReplyGenerator>) -> Self {
        Self {
            store,
            replies,
            locks: SessionLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Record one user turn and the assistant's reply.
    ///
    /// - No id (or a blank one): a fresh id is minted and a new conversation
    ///   started.
    /// - Known id: the turn is appended to that conversation.
    /// - Unknown id: a new conversation is created under that same id.
    ///
    /// Turns for one session are serialized; both messages are persisted
    /// together or not at all.
    pub async fn handle_turn(
        &self,
        session_id: Option<&str>,
        user_prompt: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let session_id = match supplied_session_id(session_id) {
            Some(id) => id.to_string(),
            None => {
                let id = new_session_id();
                info!(session_id = %id, "starting new session");
                id
            }
        };

        let _guard = self.locks.lock(&session_id).await;

        let mut transcript = match self.store.find(&session_id).await? {
            Some(conversation) => conversation.messages,
            None => {
                debug!(session_id = %session_id, "no stored conversation, creating");
                Vec::new()
            }
        };

        let user = Message::user(user_prompt);
        transcript.push(user.clone());

        let reply = self.replies.generate_reply(&transcript).await?;
        let assistant = Message::assistant(reply.content.clone());

        let conversation = self
            .store
            .append_turn(&session_id, user, assistant)
            .await?;

        debug!(
            session_id = %session_id,
            messages = conversation.messages.len(),
            "turn recorded"
        );

        Ok(TurnOutcome {
            reply: reply.content,
            explanation: reply.explanation,
            session_id,
            message_count: conversation.messages.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::models::{Conversation, Role};
    use crate::reply::{CANNED_CONTENT, CANNED_EXPLANATION, CannedReply, Reply};
    use crate::store::MemoryConversationStore;

    fn service() -> (Arc<MemoryConversationStore>, ConversationService) {
        let store = Arc::new(MemoryConversationStore::new());
        let svc = ConversationService::new(store.clone(), Arc::new(CannedReply));
        (store, svc)
    }

    #[tokio::test]
    async fn no_session_id_creates_fresh_conversation() {
        let (store, svc) = service();

        let first = svc.handle_turn(None, "Test message").await.unwrap();
        let second = svc.handle_turn(None, "Another").await.unwrap();

        assert_ne!(first.session_id, second.session_id);
        assert_eq!(first.reply, CANNED_CONTENT);
        assert_eq!(first.explanation, CANNED_EXPLANATION);
        assert_eq!(first.message_count, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn blank_session_id_is_treated_as_absent() {
        let (_, svc) = service();
        let outcome = svc.handle_turn(Some(""), "hi").await.unwrap();
        assert!(!outcome.session_id.is_empty());
    }

    #[tokio::test]
    async fn known_session_id_resumes_same_conversation() {
        let (store, svc) = service();

        let first = svc.handle_turn(None, "one").await.unwrap();
        let second = svc
            .handle_turn(Some(first.session_id.as_str()), "two")
            .await
            .unwrap();

        assert_eq!(second.session_id, first.session_id);
        assert_eq!(second.message_count, first.message_count + 2);
        assert_eq!(store.len(), 1);

        let conversation = store.find(&first.session_id).await.unwrap().unwrap();
        let contents: Vec<&str> = conversation
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["one", CANNED_CONTENT, "two", CANNED_CONTENT]);
    }

    #[tokio::test]
    async fn unknown_session_id_is_recreated_under_same_id() {
        let (store, svc) = service();

        let outcome = svc.handle_turn(Some("stale-id"), "hello").await.unwrap();

        assert_eq!(outcome.session_id, "stale-id");
        assert_eq!(outcome.message_count, 2);
        let conversation = store.find("stale-id").await.unwrap().expect("created");
        assert_eq!(conversation.messages[0].role, Role::User);
        assert_eq!(conversation.messages[0].content, "hello");
        assert_eq!(conversation.messages[1].role, Role::Assistant);
    }

    /// Yields before replying and echoes the prompt, so interleaving would be
    /// visible in the stored transcript.
    struct SlowEcho;

    #[async_trait]
    impl ReplyGenerator for SlowEcho {
        async fn generate_reply(&self, transcript: &[Message]) -> Result<Reply, ReplyError> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let prompt = transcript.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(Reply::new(format!("re: {prompt}"), ""))
        }
    }

    #[tokio::test]
    async fn concurrent_turns_for_one_session_keep_both() {
        let store = Arc::new(MemoryConversationStore::new());
        let svc = ConversationService::new(store.clone(), Arc::new(SlowEcho));

        let (a, b) = tokio::join!(
            svc.handle_turn(Some("shared"), "first"),
            svc.handle_turn(Some("shared"), "second"),
        );
        let counts = {
            let mut c = vec![a.unwrap().message_count, b.unwrap().message_count];
            c.sort();
            c
        };
        assert_eq!(counts, vec![2, 4]);

        let conversation = store.find("shared").await.unwrap().unwrap();
        assert_eq!(conversation.messages.len(), 4);
        for pair in conversation.messages.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].content, format!("re: {}", pair[0].content));
        }
        assert_eq!(svc.locks.active(), 0);
    }

    /// The reply generator sees the whole prior transcript plus the new prompt.
    struct CountingReply;

    #[async_trait]
    impl ReplyGenerator for CountingReply {
        async fn generate_reply(&self, transcript: &[Message]) -> Result<Reply, ReplyError> {
            Ok(Reply::new(format!("seen {}", transcript.len()), ""))
        }
    }

    #[tokio::test]
    async fn generator_receives_full_transcript() {
        let store = Arc::new(MemoryConversationStore::new());
        let svc = ConversationService::new(store, Arc::new(CountingReply));

        let first = svc.handle_turn(Some("s"), "a").await.unwrap();
        let second = svc.handle_turn(Some("s"), "b").await.unwrap();
        assert_eq!(first.reply, "seen 1");
        assert_eq!(second.reply, "seen 3");
    }

    struct FailingStore;

    #[async_trait]
    impl ConversationStore for FailingStore {
        async fn find(&self, _: &str) -> Result<Option<Conversation>, StoreError> {
            Ok(None)
        }

        async fn append_turn(
            &self,
            _: &str,
            _: Message,
            _: Message,
        ) -> Result<Conversation, StoreError> {
            Err(StoreError::Corrupt("disk on fire".into()))
        }
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_error() {
        let svc = ConversationService::new(Arc::new(FailingStore), Arc::new(CannedReply));
        let err = svc.handle_turn(None, "hi").await.unwrap_err();
        assert!(matches!(err, TurnError::Store(_)));
        assert_eq!(svc.locks.active(), 0);
    }

    #[tokio::test]
    async fn cancelled_waiter_prunes_its_entry() {
        let locks = SessionLocks::new();
        let holder = locks.lock("k").await;

        let mut waiter = Box::pin(locks.lock("k"));
        let waited = tokio::time::timeout(Duration::from_millis(10), waiter.as_mut()).await;
        assert!(waited.is_err(), "second lock must queue behind the holder");

        drop(holder);
        assert_eq!(locks.active(), 1, "queued waiter keeps the entry alive");

        drop(waiter);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn waiter_acquires_after_holder_releases() {
        let locks = SessionLocks::new();
        let holder = locks.lock("k").await;
        let mut waiter = Box::pin(locks.lock("k"));
        assert!(
            tokio::time::timeout(Duration::from_millis(10), waiter.as_mut())
                .await
                .is_err()
        );

        drop(holder);
        let acquired = waiter.await;
        assert_eq!(locks.active(), 1);
        drop(acquired);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn locks_are_pruned_after_use() {
        let locks = SessionLocks::new();
        {
            let _a = locks.lock("x").await;
            assert_eq!(locks.active(), 1);
        }
        assert_eq!(locks.active(), 0);
    }
}
