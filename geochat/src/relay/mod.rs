//! Relay of chat turns to the upstream generative-language API.
//!
//! [`GeminiRelay`] talks to the upstream directly. [`HttpRelay`] talks to a running
//! relay endpoint (see [`crate::server`]). Both implement [`Relay`].

mod api;
mod config;
mod gemini;
mod http;
pub mod proto;

use std::future::Future;

pub use api::{ChatRequest, ChatResponse, ErrorResponse, RELAY_ROUTE};
pub use config::{RelayConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use gemini::GeminiRelay;
pub use http::HttpRelay;

#[cfg(test)]
pub(crate) use gemini::tests as test_support;

use crate::error::RelayError;
use crate::models::Message;

/// Turns a user message plus trailing history into an assistant reply.
pub trait Relay {
    fn respond(
        &self,
        message: &str,
        history: &[Message],
    ) -> impl Future<Output = Result<String, RelayError>> + Send;
}
