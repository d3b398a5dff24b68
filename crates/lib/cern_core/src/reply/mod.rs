//! Reply generation.
//!
//! The turn service asks a [`ReplyGenerator`] for the assistant's answer to a
//! transcript. [`CannedReply`] is the fixed stub, [`RemoteReply`] forwards
//! the transcript to an inference service, and [`Guardrail`] wraps either to
//! keep replies in persona.

mod guardrail;
mod remote;
mod thought;

pub use guardrail::{BANNED_WORDS, Guardrail, IDENTITY_SCRIPT};
pub use remote::RemoteReply;
pub use thought::split_thought;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Message;

/// Fixed reply content returned by [`CannedReply`].
pub const CANNED_CONTENT: &str = "This is a test response from the new backend!";

/// Fixed explanation returned by [`CannedReply`].
pub const CANNED_EXPLANATION: &str = "I am testing the new database connection.";

/// An assistant reply plus the optional reasoning shown behind a toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    pub explanation: String,
}

impl Reply {
    pub fn new(content: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            explanation: explanation.into(),
        }
    }
}

/// Reply generation errors.
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("Invalid transcript: {0}")]
    InvalidTranscript(String),

    #[error("Inference service error: {0}")]
    Provider(String),

    #[error("Invalid inference URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Produces the assistant's reply for a transcript whose last entry is the
/// user message being answered.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate_reply(&self, transcript: &[Message]) -> Result<Reply, ReplyError>;
}

/// Always answers with the same content and explanation.
#[derive(Debug, Clone, Default)]
pub struct CannedReply;

#[async_trait]
impl ReplyGenerator for CannedReply {
    async fn generate_reply(&self, _transcript: &[Message]) -> Result<Reply, ReplyError> {
        Ok(Reply::new(CANNED_CONTENT, CANNED_EXPLANATION))
    }
}
