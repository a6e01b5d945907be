//! Message model representing a single turn in a conversation.

use serde::{Deserialize, Deserializer, Serialize};

/// Text of the assistant greeting every new or cleared conversation starts with.
pub const WELCOME_TEXT: &str = "Welcome to GeoScience Chat! I'm here to help with questions about weather, earth science, geomatics, and environmental data. How can I assist you today?";

/// Who authored a message.
///
/// Stored and sent over the wire as the display name in the `sender` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// The person typing.
    #[default]
    Human,
    /// The AI assistant.
    Assistant,
}

impl Role {
    /// Name shown next to the message and stored in the `sender` field.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Human => "You",
            Self::Assistant => "Gemini AI",
        }
    }

    /// Role name understood by the upstream generative-language API.
    pub const fn upstream_role(self) -> &'static str {
        match self {
            Self::Human => "user",
            Self::Assistant => "model",
        }
    }

    /// Parse a stored sender name. Anything that is not the assistant is the human.
    pub fn from_sender(sender: &str) -> Self {
        if sender == Self::Assistant.display_name() {
            Self::Assistant
        } else {
            Self::Human
        }
    }
}

impl From<String> for Role {
    fn from(sender: String) -> Self {
        Self::from_sender(&sender)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.display_name().to_string()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A message in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message. Missing or `null` senders are the human.
    #[serde(default, deserialize_with = "deserialize_sender")]
    pub sender: Role,
    /// Message body (markdown for assistant replies).
    pub text: String,
}

impl Message {
    pub fn new(sender: Role, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }

    pub fn human(text: impl Into<String>) -> Self {
        Self::new(Role::Human, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

fn deserialize_sender<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    let sender = Option::<String>::deserialize(deserializer)?;
    Ok(sender.map(Role::from).unwrap_or_default())
}

/// The seeded message sequence of a fresh conversation.
pub fn welcome_messages() -> Vec<Message> {
    vec![Message::assistant(WELCOME_TEXT)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_serializes_as_display_name() {
        let json = serde_json::to_string(&Message::human("hi")).unwrap();
        assert_eq!(json, r#"{"sender":"You","text":"hi"}"#);

        let json = serde_json::to_string(&Message::assistant("hello")).unwrap();
        assert_eq!(json, r#"{"sender":"Gemini AI","text":"hello"}"#);
    }

    #[test]
    fn unknown_sender_is_human() {
        let msg: Message = serde_json::from_str(r#"{"sender":"Someone","text":"x"}"#).unwrap();
        assert_eq!(msg.sender, Role::Human);

        let msg: Message = serde_json::from_str(r#"{"sender":"Gemini AI","text":"x"}"#).unwrap();
        assert_eq!(msg.sender, Role::Assistant);
    }

    #[test]
    fn missing_or_null_sender_is_human() {
        let msg: Message = serde_json::from_str(r#"{"text":"no sender"}"#).unwrap();
        assert_eq!(msg.sender, Role::Human);

        let msg: Message = serde_json::from_str(r#"{"sender":null,"text":"x"}"#).unwrap();
        assert_eq!(msg.sender, Role::Human);
    }

    #[test]
    fn upstream_roles() {
        assert_eq!(Role::Human.upstream_role(), "user");
        assert_eq!(Role::Assistant.upstream_role(), "model");
    }
}
