//! Client-side chat controller.
//!
//! A turn is split into [`ChatSession::begin_send`] and [`ChatSession::complete`] so the
//! target conversation is fixed when the message is sent. A reply that arrives after the
//! user switched conversations still lands where the question was asked.

use tracing::warn;

use crate::error::{RelayError, SessionError};
use crate::models::Message;
use crate::store::{ConversationStore, PersistencePort, HISTORY_WINDOW};

/// Transcript text when the relay could not be reached.
pub const CONNECTION_FAILURE_TEXT: &str =
    "Sorry, there was an error connecting to the AI service.";

/// Transcript text when the upstream API rejected the request.
pub const UPSTREAM_FAILURE_TEXT: &str = "Error: Failed to get AI response";

/// A turn that has been sent and is waiting for its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    /// Conversation the reply belongs to.
    pub conversation_id: String,
    /// The user's message as sent.
    pub message: String,
    /// Messages preceding the user's message, oldest first.
    pub history: Vec<Message>,
}

/// Owns the conversation store and enforces one outstanding turn at a time.
pub struct ChatSession<P> {
    store: ConversationStore<P>,
    in_flight: Option<String>,
}

impl<P: PersistencePort> ChatSession<P> {
    pub const fn new(store: ConversationStore<P>) -> Self {
        Self {
            store,
            in_flight: None,
        }
    }

    pub const fn store(&self) -> &ConversationStore<P> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConversationStore<P> {
        &mut self.store
    }

    /// Append the user's message to the active conversation and prepare the relay call.
    pub fn begin_send(&mut self, text: &str) -> Result<PendingTurn, SessionError> {
        if self.in_flight.is_some() {
            return Err(SessionError::Busy);
        }
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let conversation_id = self.store.active_id().to_string();
        let history = self.store.history(&conversation_id, HISTORY_WINDOW);
        if !self
            .store
            .append_message(&conversation_id, Message::human(text))
        {
            return Err(SessionError::UnknownConversation(conversation_id));
        }

        self.in_flight = Some(conversation_id.clone());
        Ok(PendingTurn {
            conversation_id,
            message: text.to_string(),
            history,
        })
    }

    /// Record the outcome of a turn in the conversation it was sent from.
    ///
    /// Failures become an assistant message so the transcript stays coherent.
    pub fn complete(
        &mut self,
        pending: PendingTurn,
        outcome: Result<String, RelayError>,
    ) -> Message {
        self.in_flight = None;

        let reply = match outcome {
            Ok(text) => Message::assistant(text),
            Err(e) => {
                warn!(error = %e, conversation = %pending.conversation_id, "Relay call failed");
                Message::assistant(transcript_text(&e))
            }
        };

        // A conversation that vanished mid-flight (store reset) loses the reply.
        if !self
            .store
            .append_message(&pending.conversation_id, reply.clone())
        {
            warn!(
                conversation = %pending.conversation_id,
                "Discarding reply for a conversation that no longer exists"
            );
        }
        reply
    }
}

/// What the transcript shows for a failed relay call.
pub fn transcript_text(err: &RelayError) -> String {
    match err {
        RelayError::Network(_) => CONNECTION_FAILURE_TEXT.to_string(),
        RelayError::Upstream { .. } => UPSTREAM_FAILURE_TEXT.to_string(),
        other => format!("Error: {}", other.public_message()),
    }
}
