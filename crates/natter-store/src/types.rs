//! Chat and message data model

use serde::{Deserialize, Serialize};

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire name of this role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Streaming lifecycle of an assistant message.
///
/// An explicit tagged state instead of a reserved sentinel identifier:
/// the placeholder shown while awaiting a reply is `Pending`, the growing
/// reply is `Streaming`, and everything settled is `Complete`. Persisted
/// data without the field loads as `Complete`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Placeholder awaiting the first byte of a reply
    Pending,
    /// Reply text still growing, append-only
    Streaming,
    /// Settled; the text will not change again
    #[default]
    Complete,
}

/// One turn in a chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub role: Role,
    pub text: String,
    /// Creation time in epoch milliseconds
    pub timestamp: i64,
    #[serde(default)]
    pub status: MessageStatus,
}

impl Message {
    /// Create a settled message
    pub fn new(chat_id: &str, role: Role, text: &str) -> Self {
        Self {
            id: new_id(),
            chat_id: chat_id.to_string(),
            role,
            text: text.to_string(),
            timestamp: now_millis(),
            status: MessageStatus::Complete,
        }
    }

    /// Create a settled assistant message
    pub fn assistant(chat_id: &str, text: &str) -> Self {
        Self::new(chat_id, Role::Assistant, text)
    }

    /// The placeholder shown while the backend has not answered yet
    pub(crate) fn pending(chat_id: &str) -> Self {
        Self {
            id: new_id(),
            chat_id: chat_id.to_string(),
            role: Role::Assistant,
            text: "...".to_string(),
            timestamp: now_millis(),
            status: MessageStatus::Pending,
        }
    }

    /// An empty assistant message about to receive streamed deltas
    pub(crate) fn streaming(chat_id: &str, id: &str) -> Self {
        Self {
            id: id.to_string(),
            chat_id: chat_id.to_string(),
            role: Role::Assistant,
            text: String::new(),
            timestamp: now_millis(),
            status: MessageStatus::Streaming,
        }
    }
}

/// A named, ordered conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
}

impl Chat {
    /// Create an empty chat with a fresh identifier
    pub fn new(title: &str) -> Self {
        Self {
            id: new_id(),
            title: title.to_string(),
            messages: Vec::new(),
        }
    }
}

/// Default title for an auto-created chat: the first ~20 characters of
/// the message, ellipsis-suffixed when cut.
pub fn truncate_title(text: &str) -> String {
    const MAX_CHARS: usize = 20;
    if text.chars().count() > MAX_CHARS {
        let head: String = text.chars().take(MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
