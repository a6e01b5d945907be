//! Conversation model: a named, ordered thread of messages.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::{welcome_messages, Message};

/// Id of the conversation created when there is no usable stored state.
pub const DEFAULT_CONVERSATION_ID: &str = "current";

/// Name of the conversation created when there is no usable stored state.
pub const DEFAULT_CONVERSATION_NAME: &str = "Current Chat";

/// Name given to conversations created with "new chat".
pub const NEW_CONVERSATION_NAME: &str = "New Chat";

/// A conversation with its full message history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique, opaque identifier.
    pub id: String,
    /// User-editable name. Never empty.
    pub name: String,
    /// Messages in turn order.
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create a conversation seeded with the welcome message.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            messages: welcome_messages(),
        }
    }

    /// The conversation used when nothing could be loaded.
    pub fn default_conversation() -> Self {
        Self::new(DEFAULT_CONVERSATION_ID, DEFAULT_CONVERSATION_NAME)
    }

    /// A "New Chat" conversation with a fresh time-ordered id.
    pub fn fresh() -> Self {
        Self::new(Uuid::now_v7().to_string(), NEW_CONVERSATION_NAME)
    }

    /// Creation time recovered from the id, when the id encodes one.
    ///
    /// Understands UUIDv7 ids and the millisecond timestamps older clients used.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        if let Ok(uuid) = Uuid::parse_str(&self.id) {
            let (secs, nanos) = uuid.get_timestamp()?.to_unix();
            let secs = i64::try_from(secs).ok()?;
            return Utc.timestamp_opt(secs, nanos).single();
        }
        let millis: i64 = self.id.parse().ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }

    /// The last `window` messages, oldest first.
    pub fn recent(&self, window: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(window);
        &self.messages[start..]
    }
}
