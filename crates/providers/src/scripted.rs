//! A deterministic provider driven by prompt-substring rules.
//!
//! Used by tests across the workspace to stand in for a real model:
//! each rule matches a substring of the prompt and answers with canned
//! text, an error, or a stall. Every request is recorded.

use async_trait::async_trait;
use meetwise_core::error::ProviderError;
use meetwise_core::message::Message;
use meetwise_core::provider::{Provider, ProviderRequest, ProviderResponse};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(ProviderError),
    Stall(Duration),
}

#[derive(Debug, Clone)]
struct Rule {
    needle: String,
    reply: Reply,
}

#[derive(Debug, Default)]
pub struct ScriptedProvider {
    rules: Vec<Rule>,
    fallback: Option<Reply>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer prompts containing `needle` with `text`. Earlier rules win.
    pub fn on(mut self, needle: impl Into<String>, text: impl Into<String>) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            reply: Reply::Text(text.into()),
        });
        self
    }

    /// Answer prompts containing `needle` with a serialized JSON value.
    pub fn on_json(self, needle: impl Into<String>, value: serde_json::Value) -> Self {
        self.on(needle, value.to_string())
    }

    /// Fail prompts containing `needle`.
    pub fn fail_on(mut self, needle: impl Into<String>, error: ProviderError) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            reply: Reply::Fail(error),
        });
        self
    }

    /// Sleep on prompts containing `needle`, then fail with a timeout.
    pub fn stall_on(mut self, needle: impl Into<String>, duration: Duration) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            reply: Reply::Stall(duration),
        });
        self
    }

    /// Reply used when no rule matches.
    pub fn otherwise(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(Reply::Text(text.into()));
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn call_count(&self) -> usize {
        self.requests().len()
    }

    /// Number of requests whose prompt contained `needle`.
    pub fn calls_matching(&self, needle: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| prompt_text(r).contains(needle))
            .count()
    }

    fn record(&self, request: ProviderRequest) {
        match self.requests.lock() {
            Ok(mut requests) => requests.push(request),
            Err(poisoned) => poisoned.into_inner().push(request),
        }
    }
}

/// All message contents of a request, joined.
pub fn prompt_text(request: &ProviderRequest) -> String {
    request
        .messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let prompt = prompt_text(&request);
        let model = request.model.clone();
        self.record(request);

        let reply = self
            .rules
            .iter()
            .find(|rule| prompt.contains(&rule.needle))
            .map(|rule| rule.reply.clone())
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| ProviderError::NotConfigured("no scripted reply for prompt".into()))?;

        match reply {
            Reply::Text(text) => Ok(ProviderResponse {
                message: Message::assistant(text),
                usage: None,
                model,
            }),
            Reply::Fail(error) => Err(error),
            Reply::Stall(duration) => {
                tokio::time::sleep(duration).await;
                Err(ProviderError::Timeout(format!("stalled for {}ms", duration.as_millis())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meetwise_core::provider::ResponseShape;

    fn request(prompt: &str) -> ProviderRequest {
        ProviderRequest {
            model: "test".into(),
            messages: vec![Message::user(prompt)],
            temperature: 0.7,
            max_tokens: None,
            shape: ResponseShape::Text,
        }
    }

    #[tokio::test]
    async fn first_matching_rule_wins() {
        let provider = ScriptedProvider::new()
            .on("summary", "first")
            .on("summary please", "second");
        let response = provider.complete(request("a summary please")).await.unwrap();
        assert_eq!(response.message.content, "first");
    }

    #[tokio::test]
    async fn unmatched_without_fallback_fails() {
        let provider = ScriptedProvider::new().on("brief", "x");
        let err = provider.complete(request("follow-up")).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn records_requests_and_counts_matches() {
        let provider = ScriptedProvider::new().otherwise("ok");
        provider.complete(request("Compare the following")).await.unwrap();
        provider.complete(request("Analyze the following")).await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.calls_matching("Compare"), 1);
        assert_eq!(provider.calls_matching("the following"), 2);
    }

    #[tokio::test]
    async fn scripted_failure_is_returned() {
        let provider = ScriptedProvider::new()
            .fail_on("boom", ProviderError::RateLimited { retry_after_secs: 1 });
        let err = provider.complete(request("boom")).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { .. }));
    }
}
