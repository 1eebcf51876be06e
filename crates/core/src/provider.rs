//! Provider trait: the abstraction over LLM backends.
//!
//! A Provider knows how to send a prompt to an LLM and get a complete
//! response back. Implementations: OpenAI-compatible endpoints and a
//! scripted provider for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::Message;

/// The shape the caller expects the model to answer in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    /// Free text (markdown or prose).
    #[default]
    Text,
    /// A single JSON object.
    Json,
}

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "openai/gpt-4o-mini")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Expected response shape
    #[serde(default)]
    pub shape: ResponseShape,
}

fn default_temperature() -> f32 {
    0.7
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The result of a model call after shape handling.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Text(String),
    Structured(serde_json::Value),
}

impl Completion {
    /// The text body, if this is a text completion.
    pub fn into_text(self) -> Option<String> {
        match self {
            Completion::Text(text) => Some(text),
            Completion::Structured(_) => None,
        }
    }

    /// The JSON value, if this is a structured completion.
    pub fn into_structured(self) -> Option<serde_json::Value> {
        match self {
            Completion::Structured(value) => Some(value),
            Completion::Text(_) => None,
        }
    }
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. Callers go through
/// `complete()` without knowing which backend is in use.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_request_defaults() {
        let json = r#"{"model":"gpt-4o-mini","messages":[]}"#;
        let req: ProviderRequest = serde_json::from_str(json).unwrap();
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(req.shape, ResponseShape::Text);
        assert!(req.max_tokens.is_none());
    }

    #[test]
    fn completion_accessors() {
        let text = Completion::Text("hello".into());
        assert_eq!(text.clone().into_text().as_deref(), Some("hello"));
        assert!(text.into_structured().is_none());

        let structured = Completion::Structured(serde_json::json!({"a": 1}));
        assert_eq!(structured.into_structured().unwrap()["a"], 1);
    }
}
