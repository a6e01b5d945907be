use std::sync::Arc;

use reqwest::Client;
use tracing::debug;

use super::config::RelayConfig;
use super::proto;
use super::Relay;
use crate::error::RelayError;
use crate::models::Message;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Stateless relay calling the upstream API in-process.
#[derive(Clone, Debug)]
pub struct GeminiRelay {
    client: Client,
    config: Arc<RelayConfig>,
}

impl GeminiRelay {
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RelayError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Relay one turn upstream. Makes exactly one request and never retries.
    pub async fn respond(&self, message: &str, history: &[Message]) -> Result<String, RelayError> {
        if message.trim().is_empty() {
            return Err(RelayError::InvalidRequest("message is empty".to_string()));
        }
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(RelayError::Configuration(
                "upstream API key is not set (GEMINI_API_KEY)".to_string(),
            ));
        };

        let request = proto::create_request(message, history, &self.config.generation);
        debug!(
            turns = request.contents.len(),
            model = %self.config.model,
            "Sending generateContent request"
        );

        let resp = self
            .client
            .post(self.config.endpoint())
            .header(API_KEY_HEADER, api_key)
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
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(proto::extract_text(&body))
    }
}

impl Relay for GeminiRelay {
    async fn respond(&self, message: &str, history: &[Message]) -> Result<String, RelayError> {
        Self::respond(self, message, history).await
    }
}
