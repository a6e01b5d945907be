use std::time::Duration;

use reqwest::Client;

use super::api::{ChatRequest, ChatResponse, ErrorResponse, RELAY_ROUTE};
use super::Relay;
use crate::error::{RelayError, CONFIGURATION_FAILURE, UNHANDLED_FAILURE};
use crate::models::Message;

/// How long to wait for the relay before giving up on a turn.
const RELAY_TIMEOUT: Duration = Duration::from_secs(90);

/// Client of a relay endpoint served by `geochat serve`.
#[derive(Clone, Debug)]
pub struct HttpRelay {
    client: Client,
    url: String,
}

impl HttpRelay {
    /// `server` is the base URL of the relay, e.g. `http://127.0.0.1:58231`.
    pub fn new(server: &str) -> Result<Self, RelayError> {
        Self::with_timeout(server, RELAY_TIMEOUT)
    }

    pub fn with_timeout(server: &str, timeout: Duration) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: format!("{}{RELAY_ROUTE}", server.trim_end_matches('/')),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Rebuild the relay error from the endpoint's status and error body.
    fn classify(status: u16, body: String) -> RelayError {
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or_default();
        match status {
            400 => RelayError::InvalidRequest(message),
            500 if message == CONFIGURATION_FAILURE => RelayError::Configuration(message),
            500 if message == UNHANDLED_FAILURE => RelayError::Unhandled(message),
            _ => RelayError::Upstream { status, body },
        }
    }
}

impl Relay for HttpRelay {
    async fn respond(&self, message: &str, history: &[Message]) -> Result<String, RelayError> {
        let request = ChatRequest {
            message: Some(message.to_string()),
            history: history.to_vec(),
        };

        let resp = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RelayError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| RelayError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(Self::classify(status.as_u16(), body));
        }

        serde_json::from_str::<ChatResponse>(&body)
            .map(|r| r.response)
            .map_err(|e| RelayError::Unhandled(format!("malformed relay response: {e}")))
    }
}
