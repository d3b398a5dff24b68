//! Persona guardrail.

use async_trait::async_trait;
use tracing::warn;

use super::{Reply, ReplyError, ReplyGenerator};
use crate::models::Message;

/// Words that must never appear in a reply, matched case-insensitively.
pub const BANNED_WORDS: &[&str] = &["deepseek", "gemini", "chatgpt", "openai", "google", "china"];

/// Safe in-persona answer used when a reply trips the guardrail.
pub const IDENTITY_SCRIPT: &str = "I'm Cern, a senior specialist from the customer experience \
     team here at Regime Audio. My purpose is to provide the best support possible for our \
     products.";

const OVERRIDE_EXPLANATION: &str = "Out-of-scope query.";

/// Replaces any reply that mentions a banned word with [`IDENTITY_SCRIPT`].
#[derive(Debug, Clone)]
pub struct Guardrail<G> {
    inner: G,
}

impl<G> Guardrail<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }
}

fn banned_word_in(reply: &Reply) -> Option<&'static str> {
    let content = reply.content.to_lowercase();
    let explanation = reply.explanation.to_lowercase();
    BANNED_WORDS
        .iter()
        .copied()
        .find(|word| content.contains(word) || explanation.contains(word))
}

#[async_trait]
impl<G: ReplyGenerator> ReplyGenerator for Guardrail<G> {
    async fn generate_reply(&self, transcript: &[Message]) -> Result<Reply, ReplyError> {
        let reply = self.inner.generate_reply(transcript).await?;
        match banned_word_in(&reply) {
            Some(word) => {
                warn!(banned_word = word, "guardrail triggered, overriding reply");
                Ok(Reply::new(IDENTITY_SCRIPT, OVERRIDE_EXPLANATION))
            }
            None => Ok(reply),
        }
    }
}
