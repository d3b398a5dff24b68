//! Client-side session manager.
//!
//! Owns the transcript the user sees, the adopted session id, and the busy
//! flag that keeps at most one turn in flight. Each turn moves
//! `idle → sending → {resolved | errored} → idle`; nothing is ever removed
//! from the transcript.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

use crate::models::ChatRequest;
use crate::storage::SessionStorage;
use crate::transport::{ChatTransport, TransportError};

/// Opening message shown before the first turn.
pub const GREETING: &str =
    "Hello! Welcome to Regime. I'm Cern, your product specialist. How can I assist you today?";
const GREETING_THOUGHT: &str = "Initial greeting message for the user.";

pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";
pub const CLIENT_ERROR_MESSAGE: &str =
    "There was a problem with your request. Please try rephrasing.";
pub const CONNECTIVITY_MESSAGE: &str = "I'm sorry, I'm having trouble connecting to my systems \
     right now. Please try again in a moment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptRole {
    User,
    Cern,
}

/// One line of the visible conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub role: TranscriptRole,
    pub content: String,
    /// Reasoning attached to an assistant reply, if the server sent any.
    pub thought: Option<String>,
    pub thought_visible: bool,
}

impl TranscriptEntry {
    fn user(content: impl Into<String>) -> Self {
        Self {
            role: TranscriptRole::User,
            content: content.into(),
            thought: None,
            thought_visible: false,
        }
    }

    fn cern(content: impl Into<String>, thought: Option<String>) -> Self {
        Self {
            role: TranscriptRole::Cern,
            content: content.into(),
            thought: thought.filter(|t| !t.trim().is_empty()),
            thought_visible: false,
        }
    }
}

/// What happened to a [`SessionManager::submit_turn`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank prompt or a turn already in flight; nothing changed.
    Skipped,
    /// The server replied; the reply was appended.
    Replied,
    /// The request failed; this message was appended in place of a reply.
    Errored(String),
}

/// Map a failed request to the text shown in the transcript.
pub fn error_message(err: &TransportError) -> String {
    match err {
        TransportError::Status(code) if *code >= 500 => SERVER_ERROR_MESSAGE.to_string(),
        TransportError::Status(code) if *code >= 400 => CLIENT_ERROR_MESSAGE.to_string(),
        TransportError::Status(code) => format!("API request failed with status {code}"),
        TransportError::Network(_) | TransportError::Decode(_) | TransportError::Url(_) => {
            CONNECTIVITY_MESSAGE.to_string()
        }
    }
}

#[derive(Debug)]
struct State {
    transcript: Vec<TranscriptEntry>,
    session_id: Option<String>,
}

/// Clears the busy flag when dropped, whichever way the turn ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Keeps the transcript and session continuity for one user.
pub struct SessionManager<T, S> {
    transport: T,
    storage: S,
    busy: AtomicBool,
    state: Mutex<State>,
}

impl<T: ChatTransport, S: SessionStorage> SessionManager<T, S> {
    /// A fresh manager showing only the greeting. Call
    /// [`restore_session`](Self::restore_session) to pick up a stored token.
    pub fn new(transport: T, storage: S) -> Self {
        Self {
            transport,
            storage,
            busy: AtomicBool::new(false),
            state: Mutex::new(State {
                transcript: vec![TranscriptEntry::cern(
                    GREETING,
                    Some(GREETING_THOUGHT.to_string()),
                )],
                session_id: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adopt the stored session token, if there is one. A missing or
    /// unreadable token just means the next turn starts a new session.
    pub fn restore_session(&self) -> Option<String> {
        let stored = match self.storage.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!("could not read stored session id: {e}");
                None
            }
        };
        if let Some(id) = &stored {
            debug!("restored session {id}");
            self.state().session_id = Some(id.clone());
        }
        stored
    }

    /// Send one user turn.
    ///
    /// The user entry is appended before the request goes out and stays
    /// whatever happens. On success the reply is appended and any returned
    /// session id is adopted and stored; on failure a synthesized assistant
    /// entry explains what went wrong.
    pub async fn submit_turn(&self, prompt: &str) -> SubmitOutcome {
        if prompt.trim().is_empty() {
            return SubmitOutcome::Skipped;
        }
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            debug!("turn already in flight, ignoring submission");
            return SubmitOutcome::Skipped;
        };

        let request = {
            let mut state = self.state();
            state.transcript.push(TranscriptEntry::user(prompt));
            ChatRequest {
                session_id: state.session_id.clone(),
                user_prompt: prompt.to_string(),
            }
        };

        match self.transport.send_turn(&request).await {
            Ok(resp) => {
                let adopted = resp.session_id.filter(|id| !id.is_empty());
                {
                    let mut state = self.state();
                    state
                        .transcript
                        .push(TranscriptEntry::cern(resp.cern_response, resp.thought_process));
                    if let Some(id) = &adopted {
                        state.session_id = Some(id.clone());
                    }
                }
                if let Some(id) = adopted
                    && let Err(e) = self.storage.save(&id)
                {
                    warn!("could not persist session id: {e}");
                }
                SubmitOutcome::Replied
            }
            Err(e) => {
                warn!("chat request failed: {e}");
                let message = error_message(&e);
                self.state()
                    .transcript
                    .push(TranscriptEntry::cern(message.clone(), None));
                SubmitOutcome::Errored(message)
            }
        }
    }

    /// Show or hide the thought behind one assistant entry.
    ///
    /// Returns the new visibility, or `None` if the entry has no thought.
    pub fn toggle_explanation(&self, index: usize) -> Option<bool> {
        let mut state = self.state();
        let entry = state.transcript.get_mut(index)?;
        entry.thought.as_ref()?;
        entry.thought_visible = !entry.thought_visible;
        Some(entry.thought_visible)
    }

    /// Drop the adopted session so the next turn starts a new one.
    pub fn forget_session(&self) {
        self.state().session_id = None;
        if let Err(e) = self.storage.clear() {
            warn!("could not clear stored session id: {e}");
        }
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.state().transcript.clone()
    }

    pub fn session_id(&self) -> Option<String> {
        self.state().session_id.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}
