//! Conversation and message types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message.
///
/// The assistant side is labelled with the persona name (`"cern"`) both on
/// the wire and in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "cern")]
    Assistant,
}

impl Role {
    /// Storage and wire label for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "cern",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "cern" => Ok(Role::Assistant),
            other => Err(format!("unknown message role '{other}'")),
        }
    }
}

/// One entry in a conversation. Never addressed on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// A message typed by the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// A reply from the assistant persona.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// A session transcript: the only persisted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub session_id: String,
    /// Conversation order; only ever appended to.
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// An empty conversation bound to `session_id`.
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append one user message and its reply, in that order.
    pub fn push_turn(&mut self, user: Message, assistant: Message) {
        self.messages.push(user);
        self.messages.push(assistant);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_labels_match_storage_format() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.as_str(), "cern");
        assert_eq!("cern".parse::<Role>(), Ok(Role::Assistant));
        assert!("assistant".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_with_persona_label() {
        let json = serde_json::to_value(Message::assistant("hi")).expect("serialize");
        assert_eq!(json["role"], "cern");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn push_turn_appends_user_then_assistant() {
        let mut conversation = Conversation::new("abc");
        conversation.push_turn(Message::user("question"), Message::assistant("answer"));
        conversation.push_turn(Message::user("again"), Message::assistant("sure"));

        let roles: Vec<Role> = conversation.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(conversation.messages[2].content, "again");
        assert!(conversation.updated_at >= conversation.created_at);
    }
}
