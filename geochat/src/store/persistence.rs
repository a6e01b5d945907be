//! Persistence port for the conversation collection.

use tracing::debug;

use super::storage::KeyValueStore;
use crate::error::StorageError;
use crate::models::Conversation;

/// Key holding the serialized conversation collection.
pub const CONVERSATIONS_KEY: &str = "conversations";

/// Key holding the active conversation id as a plain string.
pub const ACTIVE_CONVERSATION_KEY: &str = "activeConversation";

/// State as read back from persistence, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredState {
    pub conversations: Vec<Conversation>,
    pub active_id: Option<String>,
}

/// Where the conversation store loads from and flushes to.
pub trait PersistencePort {
    /// Read the stored state. `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<StoredState>, StorageError>;

    /// Overwrite the stored state with the full collection and active id.
    fn save(&mut self, conversations: &[Conversation], active_id: &str)
        -> Result<(), StorageError>;

    /// Remove all stored state.
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// [`PersistencePort`] over a [`KeyValueStore`], storing JSON text.
#[derive(Debug, Clone)]
pub struct KeyValuePersistence<S> {
    storage: S,
}

impl<S: KeyValueStore> KeyValuePersistence<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }
}

impl<S: KeyValueStore> PersistencePort for KeyValuePersistence<S> {
    fn load(&self) -> Result<Option<StoredState>, StorageError> {
        let Some(raw) = self.storage.get(CONVERSATIONS_KEY)? else {
            return Ok(None);
        };
        let conversations: Vec<Conversation> = serde_json::from_str(&raw)?;
        let active_id = self.storage.get(ACTIVE_CONVERSATION_KEY)?;
        debug!(count = conversations.len(), "Loaded stored conversations");
        Ok(Some(StoredState {
            conversations,
            active_id,
        }))
    }

    fn save(
        &mut self,
        conversations: &[Conversation],
        active_id: &str,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(conversations)?;
        self.storage.set(CONVERSATIONS_KEY, &raw)?;
        self.storage.set(ACTIVE_CONVERSATION_KEY, active_id)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.storage.remove(CONVERSATIONS_KEY)?;
        self.storage.remove(ACTIVE_CONVERSATION_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;

    #[test]
    fn layout_matches_stored_keys() {
        let mut persistence = KeyValuePersistence::new(MemoryStorage::new());
        let conv = Conversation::default_conversation();
        persistence.save(std::slice::from_ref(&conv), "current").unwrap();

        let raw = persistence.storage.get(CONVERSATIONS_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["id"], "current");
        assert_eq!(value[0]["name"], "Current Chat");
        assert_eq!(value[0]["messages"][0]["sender"], "Gemini AI");
        assert_eq!(
            persistence.storage.get(ACTIVE_CONVERSATION_KEY).unwrap().as_deref(),
            Some("current")
        );
    }

    #[test]
    fn load_nothing_stored() {
        let persistence = KeyValuePersistence::new(MemoryStorage::new());
        assert_eq!(persistence.load().unwrap(), None);
    }

    #[test]
    fn load_corrupt_is_error() {
        let mut persistence = KeyValuePersistence::new(MemoryStorage::new());
        persistence.storage.set(CONVERSATIONS_KEY, "{not json").unwrap();
        assert!(matches!(persistence.load(), Err(StorageError::Serialize(_))));
    }

    #[test]
    fn clear_removes_both_keys() {
        let mut persistence = KeyValuePersistence::new(MemoryStorage::new());
        persistence
            .save(&[Conversation::default_conversation()], "current")
            .unwrap();
        persistence.clear().unwrap();
        assert_eq!(persistence.load().unwrap(), None);
        assert_eq!(persistence.storage.get(ACTIVE_CONVERSATION_KEY).unwrap(), None);
    }
}
