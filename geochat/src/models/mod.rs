//! Data models for conversations and the messages they hold.

mod conversation;
mod message;

pub use conversation::{Conversation, DEFAULT_CONVERSATION_ID, NEW_CONVERSATION_NAME};
pub use message::{welcome_messages, Message, Role, WELCOME_TEXT};
