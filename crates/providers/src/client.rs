//! The model client every meetwise component calls.
//!
//! Wraps a `Provider` with the per-call deadline, response-shape handling
//! and the mapping from transport errors onto `ModelError`.

use meetwise_core::error::ModelError;
use meetwise_core::message::Message;
use meetwise_core::provider::{Completion, Provider, ProviderRequest, ResponseShape};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// One call to the model.
#[derive(Debug, Clone, Copy)]
pub struct ModelCall<'a> {
    pub prompt: &'a str,
    pub system: Option<&'a str>,
    pub shape: ResponseShape,
    pub temperature: f32,
}

impl<'a> ModelCall<'a> {
    pub fn text(prompt: &'a str) -> Self {
        Self {
            prompt,
            system: None,
            shape: ResponseShape::Text,
            temperature: 0.7,
        }
    }

    pub fn json(prompt: &'a str) -> Self {
        Self {
            shape: ResponseShape::Json,
            ..Self::text(prompt)
        }
    }

    pub fn system(mut self, system: &'a str) -> Self {
        self.system = Some(system);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Request/response access to a language model with a hard deadline.
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn Provider>,
    model: String,
    timeout: Duration,
    max_tokens: Option<u32>,
}

impl ModelClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            timeout: Duration::from_secs(60),
            max_tokens: None,
        }
    }

    /// Build a client from the configured default provider.
    pub fn from_config(config: &meetwise_config::AppConfig) -> Result<Self, ModelError> {
        let router = crate::router::build_from_config(config);
        let provider = router.default().ok_or_else(|| {
            ModelError::Unavailable(format!("provider '{}' not registered", config.default_provider))
        })?;

        Ok(Self::new(provider, crate::router::resolve_model(config))
            .with_timeout(Duration::from_secs(config.model.timeout_secs))
            .with_max_tokens(config.model.max_tokens))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send one prompt and return text or parsed JSON according to `call.shape`.
    pub async fn complete(&self, call: ModelCall<'_>) -> Result<Completion, ModelError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = call.system {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(call.prompt));

        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: call.temperature,
            max_tokens: self.max_tokens,
            shape: call.shape,
        };

        debug!(
            provider = %self.provider.name(),
            model = %self.model,
            shape = ?call.shape,
            prompt_chars = call.prompt.chars().count(),
            "Model call"
        );

        let response = match tokio::time::timeout(self.timeout, self.provider.complete(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(provider = %self.provider.name(), error = %e, "Model call failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(
                    provider = %self.provider.name(),
                    timeout_secs = self.timeout.as_secs(),
                    "Model call timed out"
                );
                return Err(ModelError::Timeout(self.timeout.as_secs()));
            }
        };

        let text = response.message.content;
        match call.shape {
            ResponseShape::Text => Ok(Completion::Text(text)),
            ResponseShape::Json => extract_json(&text).map(Completion::Structured),
        }
    }

    /// Free-text convenience wrapper around [`complete`](Self::complete).
    pub async fn text(&self, call: ModelCall<'_>) -> Result<String, ModelError> {
        let call = ModelCall {
            shape: ResponseShape::Text,
            ..call
        };
        self.complete(call)
            .await?
            .into_text()
            .ok_or_else(|| ModelError::MalformedResponse("expected text completion".into()))
    }

    /// JSON convenience wrapper around [`complete`](Self::complete).
    pub async fn json(&self, call: ModelCall<'_>) -> Result<serde_json::Value, ModelError> {
        let call = ModelCall {
            shape: ResponseShape::Json,
            ..call
        };
        self.complete(call)
            .await?
            .into_structured()
            .ok_or_else(|| ModelError::MalformedResponse("expected structured completion".into()))
    }
}

/// Parse a JSON value out of model text.
///
/// Accepts a bare document, a ```json fenced block, or a bare ``` fenced
/// block. As a last resort the outermost `{...}` span is tried.
pub fn extract_json(text: &str) -> Result<serde_json::Value, ModelError> {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    let body = body.trim();

    if let Ok(value) = serde_json::from_str(body) {
        return Ok(value);
    }

    if let (Some(start), Some(end)) = (body.find('{'), body.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str(&body[start..=end]) {
                return Ok(value);
            }
        }
    }

    let preview: String = body.chars().take(80).collect();
    Err(ModelError::MalformedResponse(format!("response is not JSON: {preview}")))
}
