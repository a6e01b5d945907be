//! Conversation state and its persistence.
//!
//! - [`KeyValueStore`] is the raw string-keyed storage service
//! - [`KeyValuePersistence`] serializes the conversation collection onto it
//! - [`ConversationStore`] owns the in-memory state and flushes after every mutation

mod conversations;
mod persistence;
mod storage;

pub use conversations::{ConversationStore, HISTORY_WINDOW};
pub use persistence::{
    KeyValuePersistence, PersistencePort, ACTIVE_CONVERSATION_KEY, CONVERSATIONS_KEY,
};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage};

/// Store backed by files in a data directory, as used by the CLI.
pub type FileConversationStore = ConversationStore<KeyValuePersistence<FileStorage>>;
