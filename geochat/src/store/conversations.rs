//! In-memory conversation collection and active pointer.

use std::collections::HashSet;

use tracing::{info, warn};

use super::persistence::{PersistencePort, StoredState};
use crate::models::{
    welcome_messages, Conversation, Message, DEFAULT_CONVERSATION_ID, NEW_CONVERSATION_NAME,
};

/// Number of trailing messages sent to the relay as history.
pub const HISTORY_WINDOW: usize = 10;

/// Authoritative state of all conversations for a session.
///
/// Every mutation flushes the whole collection and active id to the persistence port.
/// A failed flush is logged and the in-memory change is kept.
pub struct ConversationStore<P> {
    /// Most recently created first.
    conversations: Vec<Conversation>,
    active_id: String,
    persistence: P,
}

impl<P: PersistencePort> ConversationStore<P> {
    /// Load state from `persistence`, falling back to a single default conversation.
    ///
    /// Never fails: unreadable or corrupt stored data yields the default state.
    pub fn initialize(persistence: P) -> Self {
        let (conversations, active_id) = match persistence.load() {
            Ok(Some(stored)) => Self::validate(stored),
            Ok(None) => Self::default_state(),
            Err(e) => {
                warn!(error = %e, "Failed to load stored conversations, starting fresh");
                Self::default_state()
            }
        };

        Self {
            conversations,
            active_id,
            persistence,
        }
    }

    fn default_state() -> (Vec<Conversation>, String) {
        (
            vec![Conversation::default_conversation()],
            DEFAULT_CONVERSATION_ID.to_string(),
        )
    }

    /// Repair stored state so the collection invariants hold.
    fn validate(stored: StoredState) -> (Vec<Conversation>, String) {
        let mut seen = HashSet::new();
        let conversations: Vec<Conversation> = stored
            .conversations
            .into_iter()
            .filter(|c| seen.insert(c.id.clone()))
            .map(|mut c| {
                if c.messages.is_empty() {
                    c.messages = welcome_messages();
                }
                if c.name.trim().is_empty() {
                    c.name = NEW_CONVERSATION_NAME.to_string();
                }
                c
            })
            .collect();

        if conversations.is_empty() {
            return Self::default_state();
        }

        let active_id = stored
            .active_id
            .filter(|id| conversations.iter().any(|c| &c.id == id))
            .unwrap_or_else(|| conversations[0].id.clone());

        (conversations, active_id)
    }

    fn flush(&mut self) {
        if let Err(e) = self.persistence.save(&self.conversations, &self.active_id) {
            warn!(error = %e, "Failed to save conversations");
        }
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    /// All conversations, most recently created first.
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    /// The active conversation.
    pub fn active(&self) -> &Conversation {
        // Invariant: active_id always names a member and the collection is never empty.
        self.conversation(&self.active_id)
            .unwrap_or(&self.conversations[0])
    }

    /// The last `window` messages of a conversation.
    pub fn history(&self, id: &str, window: usize) -> Vec<Message> {
        self.conversation(id)
            .map(|c| c.recent(window).to_vec())
            .unwrap_or_default()
    }

    /// Prepend a new "New Chat" conversation and make it active.
    pub fn create_conversation(&mut self) -> &Conversation {
        let conversation = Conversation::fresh();
        info!(id = %conversation.id, "Created conversation");
        self.active_id.clone_from(&conversation.id);
        self.conversations.insert(0, conversation);
        self.flush();
        &self.conversations[0]
    }

    /// Append a message to a conversation. Returns `false` if the id is unknown.
    pub fn append_message(&mut self, id: &str, message: Message) -> bool {
        let Some(conversation) = self.find_mut(id) else {
            warn!(id, "Dropping message for unknown conversation");
            return false;
        };
        conversation.messages.push(message);
        self.flush();
        true
    }

    /// Rename a conversation to the trimmed `new_name`.
    ///
    /// Blank names and unknown ids leave everything unchanged and return `false`.
    pub fn rename_conversation(&mut self, id: &str, new_name: &str) -> bool {
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return false;
        }
        let Some(conversation) = self.find_mut(id) else {
            return false;
        };
        conversation.name = trimmed.to_string();
        self.flush();
        true
    }

    /// Switch the active conversation. Returns `false` if the id is unknown.
    pub fn set_active(&mut self, id: &str) -> bool {
        if self.conversation(id).is_none() {
            return false;
        }
        self.active_id = id.to_string();
        self.flush();
        true
    }

    /// Reset the active conversation to just the welcome message.
    pub fn clear_active(&mut self) {
        let id = self.active_id.clone();
        if let Some(conversation) = self.find_mut(&id) {
            conversation.messages = welcome_messages();
        }
        self.flush();
    }

    /// Wipe persisted state and return to the default conversation.
    ///
    /// The default state is held in memory only, so the next load also starts fresh
    /// unless something is mutated first.
    pub fn reset(&mut self) {
        if let Err(e) = self.persistence.clear() {
            warn!(error = %e, "Failed to clear stored conversations");
        }
        let (conversations, active_id) = Self::default_state();
        self.conversations = conversations;
        self.active_id = active_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::models::{Role, WELCOME_TEXT};
    use crate::store::{
        KeyValuePersistence, KeyValueStore, MemoryStorage, ACTIVE_CONVERSATION_KEY,
        CONVERSATIONS_KEY,
    };

    type MemoryStore = ConversationStore<KeyValuePersistence<MemoryStorage>>;

    fn fresh_store() -> MemoryStore {
        ConversationStore::initialize(KeyValuePersistence::new(MemoryStorage::new()))
    }

    fn store_with(conversations: &str, active: Option<&str>) -> MemoryStore {
        let mut storage = MemoryStorage::new();
        storage.set(CONVERSATIONS_KEY, conversations).unwrap();
        if let Some(active) = active {
            storage.set(ACTIVE_CONVERSATION_KEY, active).unwrap();
        }
        ConversationStore::initialize(KeyValuePersistence::new(storage))
    }

    /// Storage whose writes always fail.
    struct ReadOnlyStorage;

    impl KeyValueStore for ReadOnlyStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }

        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn initialize_without_stored_state() {
        let store = fresh_store();
        assert_eq!(store.conversations().len(), 1);
        assert_eq!(store.active_id(), DEFAULT_CONVERSATION_ID);
        assert_eq!(store.active().name, "Current Chat");
        assert_eq!(store.active().messages, welcome_messages());
    }

    #[test]
    fn initialize_from_corrupt_data_falls_back() {
        let store = store_with("[{\"id\": 12", Some("whatever"));
        assert_eq!(store.conversations().len(), 1);
        assert_eq!(store.active_id(), DEFAULT_CONVERSATION_ID);
    }

    #[test]
    fn initialize_from_empty_array_falls_back() {
        let store = store_with("[]", None);
        assert_eq!(store.conversations().len(), 1);
        assert_eq!(store.active_id(), DEFAULT_CONVERSATION_ID);
    }

    #[test]
    fn initialize_resolves_active_id() {
        let data = r#"[
            {"id":"a","name":"A","messages":[{"sender":"You","text":"hi"}]},
            {"id":"b","name":"B","messages":[{"sender":"You","text":"yo"}]}
        ]"#;
        assert_eq!(store_with(data, Some("b")).active_id(), "b");
        assert_eq!(store_with(data, Some("missing")).active_id(), "a");
        assert_eq!(store_with(data, None).active_id(), "a");
    }

    #[test]
    fn initialize_repairs_invalid_conversations() {
        let data = r#"[
            {"id":"a","name":"  ","messages":[]},
            {"id":"a","name":"Dup","messages":[{"sender":"You","text":"x"}]}
        ]"#;
        let store = store_with(data, Some("a"));
        assert_eq!(store.conversations().len(), 1);
        assert_eq!(store.active().name, NEW_CONVERSATION_NAME);
        assert_eq!(store.active().messages[0].text, WELCOME_TEXT);
    }

    #[test]
    fn create_conversation_prepends_and_activates() {
        let mut store = fresh_store();
        let id = store.create_conversation().id.clone();

        assert_eq!(store.conversations().len(), 2);
        assert_eq!(store.conversations()[0].id, id);
        assert_eq!(store.conversations()[0].name, NEW_CONVERSATION_NAME);
        assert_eq!(store.conversations()[0].messages, welcome_messages());
        assert_eq!(store.active_id(), id);

        let second = store.create_conversation().id.clone();
        assert_ne!(second, id);
        assert_eq!(store.conversations()[0].id, second);
    }

    #[test]
    fn append_preserves_order() {
        let mut store = fresh_store();
        assert!(store.append_message("current", Message::human("M1")));
        assert!(store.append_message("current", Message::assistant("M2")));

        let texts: Vec<_> = store.active().messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec![WELCOME_TEXT, "M1", "M2"]);
        assert_eq!(store.active().messages[2].sender, Role::Assistant);
    }

    #[test]
    fn append_to_unknown_is_noop() {
        let mut store = fresh_store();
        assert!(!store.append_message("nope", Message::human("lost")));
        assert_eq!(store.active().messages.len(), 1);
    }

    #[test]
    fn rename_trims_and_rejects_blank() {
        let mut store = fresh_store();
        assert!(store.rename_conversation("current", "  Volcanoes  "));
        assert_eq!(store.active().name, "Volcanoes");

        assert!(!store.rename_conversation("current", "   "));
        assert!(!store.rename_conversation("current", ""));
        assert_eq!(store.active().name, "Volcanoes");

        assert!(!store.rename_conversation("nope", "Other"));
    }

    #[test]
    fn set_active_ignores_unknown() {
        let mut store = fresh_store();
        let new_id = store.create_conversation().id.clone();

        assert!(store.set_active("current"));
        assert_eq!(store.active_id(), "current");

        assert!(!store.set_active("missing"));
        assert_eq!(store.active_id(), "current");

        assert!(store.set_active(&new_id));
    }

    #[test]
    fn clear_active_only_touches_active() {
        let mut store = fresh_store();
        for i in 0..4 {
            store.append_message("current", Message::human(format!("q{i}")));
        }
        let other = store.create_conversation().id.clone();
        store.append_message(&other, Message::human("keep"));
        store.set_active("current");
        assert_eq!(store.active().messages.len(), 5);

        store.clear_active();
        assert_eq!(store.active().messages, welcome_messages());
        assert_eq!(store.conversation(&other).unwrap().messages.len(), 2);
    }

    #[test]
    fn round_trip_through_persistence() {
        let mut store = fresh_store();
        let id = store.create_conversation().id.clone();
        store.append_message(&id, Message::human("What is a geoid?"));
        store.rename_conversation(&id, "Geodesy");
        store.set_active("current");

        let conversations = store.conversations().to_vec();
        let active = store.active_id().to_string();

        let reloaded = ConversationStore::initialize(store.persistence);
        assert_eq!(reloaded.conversations(), conversations.as_slice());
        assert_eq!(reloaded.active_id(), active);
    }

    #[test]
    fn clear_active_is_persisted() {
        let mut store = fresh_store();
        store.append_message("current", Message::human("q1"));
        store.append_message("current", Message::assistant("a1"));
        store.clear_active();

        let reloaded = ConversationStore::initialize(store.persistence);
        assert_eq!(reloaded.active_id(), "current");
        assert_eq!(reloaded.active().messages, welcome_messages());
    }

    #[test]
    fn save_failure_keeps_memory_state() {
        let mut store = ConversationStore::initialize(KeyValuePersistence::new(ReadOnlyStorage));
        assert!(store.append_message("current", Message::human("still here")));
        assert_eq!(store.active().messages.len(), 2);
        assert!(store.rename_conversation("current", "Renamed"));
        assert_eq!(store.active().name, "Renamed");
    }

    #[test]
    fn reset_returns_to_default() {
        let mut store = fresh_store();
        store.create_conversation();
        store.reset();
        assert_eq!(store.conversations().len(), 1);
        assert_eq!(store.active_id(), DEFAULT_CONVERSATION_ID);

        let reloaded = ConversationStore::initialize(store.persistence);
        assert_eq!(reloaded.conversations().len(), 1);
    }

    #[test]
    fn history_window() {
        let mut store = fresh_store();
        for i in 0..15 {
            store.append_message("current", Message::human(format!("m{i}")));
        }
        let history = store.history("current", HISTORY_WINDOW);
        assert_eq!(history.len(), HISTORY_WINDOW);
        assert_eq!(history[HISTORY_WINDOW - 1].text, "m14");
        assert!(store.history("missing", HISTORY_WINDOW).is_empty());
    }
}
