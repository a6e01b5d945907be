//! Wire format of the upstream `generateContent` API.

use serde::{Deserialize, Serialize};

use super::config::GenerationConfig;
use crate::models::Message;

/// Reply used when a successful upstream response carries no text.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't generate a response.";

/// Persona directive sent as the first turn of every request.
pub const SYSTEM_PROMPT: &str = r"You are a highly knowledgeable scientific AI assistant. Your purpose is to:
- Provide accurate, detailed scientific explanations
- Help users understand complex scientific concepts
- Reference relevant scientific research and theories
- Maintain scientific accuracy while being accessible
- Correct misconceptions with evidence-based information
- Use analogies and examples to explain difficult concepts
- Stay up-to-date with current scientific understanding
- Keep responses concise and to the point
- keep all responses in proper raw markdown format using the following format:

# Heading 1
## Heading 2
### Heading 3

**Bold Text**
*Italic Text*

[Link Text](https://www.example.com)

1. List Item 1
2. List Item 2
3. List Item 3

> Blockquote Text

Please maintain a professional, educational tone while being engaging and clear in your responses.";

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

const BLOCK_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn turn(role: &str, text: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireGenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
}

impl From<&GenerationConfig> for WireGenerationConfig {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            top_p: config.top_p,
            top_k: config.top_k,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetySetting {
    pub category: &'static str,
    pub threshold: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: WireGenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
}

/// Compose the upstream request: system prompt, mapped history, then the new message.
pub fn create_request(
    message: &str,
    history: &[Message],
    generation: &GenerationConfig,
) -> GenerateContentRequest {
    let mut contents = Vec::with_capacity(history.len() + 2);
    contents.push(Content::turn("user", SYSTEM_PROMPT));
    contents.extend(
        history
            .iter()
            .map(|m| Content::turn(m.sender.upstream_role(), &m.text)),
    );
    contents.push(Content::turn("user", message));

    GenerateContentRequest {
        contents,
        generation_config: generation.into(),
        safety_settings: HARM_CATEGORIES
            .iter()
            .map(|&category| SafetySetting {
                category,
                threshold: BLOCK_THRESHOLD,
            })
            .collect(),
    }
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// Text of the first part of the first candidate, or [`FALLBACK_REPLY`].
pub fn extract_text(body: &str) -> String {
    serde_json::from_str::<GenerateContentResponse>(body)
        .ok()
        .and_then(|resp| resp.candidates.into_iter().next())
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| FALLBACK_REPLY.to_string())
}
