//! Error types shared across the relay, the store and the chat session.

use thiserror::Error;

/// Caller-facing text for a missing or empty message.
pub const NO_MESSAGE: &str = "No message provided.";
/// Caller-facing text when the upstream credential is unavailable.
pub const CONFIGURATION_FAILURE: &str = "API configuration error";
/// Caller-facing text when the upstream API rejected the request.
pub const UPSTREAM_FAILURE: &str = "Failed to get response from AI";
/// Caller-facing text for every other failure.
pub const UNHANDLED_FAILURE: &str = "An error occurred while processing your request";

/// Failure of a relay call.
///
/// The `Display` output carries diagnostic detail for logs. Callers only ever see
/// [`RelayError::public_message`].
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("unhandled error: {0}")]
    Unhandled(String),
}

impl RelayError {
    /// HTTP status the relay endpoint answers with.
    pub const fn status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::Upstream { status, .. } => *status,
            Self::Configuration(_) | Self::Network(_) | Self::Unhandled(_) => 500,
        }
    }

    /// Generic message safe to show to the caller.
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => NO_MESSAGE,
            Self::Configuration(_) => CONFIGURATION_FAILURE,
            Self::Upstream { .. } => UPSTREAM_FAILURE,
            Self::Network(_) | Self::Unhandled(_) => UNHANDLED_FAILURE,
        }
    }
}

/// Failure reading or writing the key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Why a chat turn could not be started.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a message is already being sent")]
    Busy,

    #[error("conversation not found: {0}")]
    UnknownConversation(String),

    #[error("message is empty")]
    EmptyMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(RelayError::InvalidRequest(String::new()).status(), 400);
        assert_eq!(RelayError::Configuration(String::new()).status(), 500);
        assert_eq!(
            RelayError::Upstream {
                status: 503,
                body: String::new()
            }
            .status(),
            503
        );
        assert_eq!(RelayError::Network(String::new()).status(), 500);
    }

    #[test]
    fn public_message_hides_detail() {
        let err = RelayError::Configuration("GEMINI_API_KEY is not set".to_string());
        assert_eq!(err.public_message(), CONFIGURATION_FAILURE);
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }
}
