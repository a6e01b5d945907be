use std::fmt::Debug;
use std::time::Duration;

/// Default upstream model.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default upstream API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 1024,
            top_p: 0.8,
            top_k: 40,
        }
    }
}

/// Configuration for relaying to the upstream generative-language API.
///
/// Built once at startup. A missing API key is allowed here and reported per request.
#[derive(Clone, PartialEq)]
pub struct RelayConfig {
    pub(crate) api_key: Option<String>,
    pub(crate) model: String,
    pub(crate) base_url: String,
    pub(crate) timeout: Duration,
    pub(crate) generation: GenerationConfig,
}

impl RelayConfig {
    /// Creates a configuration with default model, endpoint and sampling parameters.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            generation: GenerationConfig::default(),
        }
    }

    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[inline]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// URL of the `generateContent` call for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("generation", &self.generation)
            .finish()
    }
}
