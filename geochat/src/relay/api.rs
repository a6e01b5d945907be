use serde::{Deserialize, Serialize};

use crate::models::Message;

/// Path of the relay endpoint.
pub const RELAY_ROUTE: &str = "/api/gemini-chat";

/// Body of a relay request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub history: Vec<Message>,
}

/// Body of a successful relay response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Body of a failed relay response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
