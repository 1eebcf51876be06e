//! Intent recognition: which tool a message is for, and what it mentions.

use meetwise_context::{DegradeReason, StageOutcome};
use meetwise_core::intent::{ExtractedInfo, Intent};
use meetwise_core::tool::ToolKind;
use meetwise_providers::{ModelCall, ModelClient};
use serde_json::Value;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = r#"You are an intent recognition system for a meeting assistant.
Analyze user messages and determine their intent. Possible intents include:
- "summarization": User wants to summarize a past meeting (e.g., "summarize my last meeting", "summarize meeting with X")
- "meeting_brief": User wants a brief/preparation for an upcoming meeting (e.g., "prepare me for my meeting with X")
- "followup": User wants to generate a follow-up email (e.g., "send follow-up email", "write follow-up")
- "general": General questions or conversation

EXTRACTION RULES:
1. client_name: company or client names, including acronyms (e.g., "MTCA", "Good Health"). Do not extract common words like "meeting", "last", "my" or "the". Use null when no client is mentioned.
2. date: any date the user mentions, exactly as written or in ISO format (YYYY-MM-DD) when a year is present. Use null when no date is mentioned.
3. meeting_id: a meeting identifier if one is explicitly mentioned, otherwise null.

Respond in JSON format:
{
    "intent": "summarization|meeting_brief|followup|general",
    "confidence": 0.0-1.0,
    "extracted_info": {
        "client_name": "string or null",
        "meeting_id": "string or null",
        "date": "string or null"
    }
}"#;

pub struct IntentRecognizer {
    client: ModelClient,
}

impl IntentRecognizer {
    pub fn new(client: ModelClient) -> Self {
        Self { client }
    }

    /// Classify `message`. Any failure falls back to `general` at 0.5.
    pub async fn recognize(&self, message: &str) -> StageOutcome<Intent> {
        let prompt = format!("User message: {message}\n\nAnalyze the intent and respond in JSON format.");
        let call = ModelCall::json(&prompt).system(SYSTEM_PROMPT).temperature(0.3);

        let outcome = match self.client.json(call).await {
            Ok(value) => match parse_intent(&value) {
                Some(intent) => StageOutcome::Ok(intent),
                None => StageOutcome::degraded(
                    Intent::general_fallback(),
                    DegradeReason::MalformedUpstreamResponse("intent response is not a JSON object".into()),
                ),
            },
            Err(e) => StageOutcome::degraded(Intent::general_fallback(), e),
        };

        match outcome.reason() {
            Some(reason) => warn!(stage = "recognize_intent", %reason, "Falling back to general intent"),
            None => debug!(tool = %outcome.value().tool, confidence = outcome.value().confidence, "Intent recognized"),
        }
        outcome
    }
}

fn parse_intent(value: &Value) -> Option<Intent> {
    let object = value.as_object()?;
    let tool = object
        .get("intent")
        .and_then(Value::as_str)
        .and_then(ToolKind::parse)
        .unwrap_or(ToolKind::General);
    let confidence = object
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| c.clamp(0.0, 1.0) as f32)
        .unwrap_or(0.5);
    let extracted = object.get("extracted_info").map(parse_extracted).unwrap_or_default();

    Some(Intent {
        tool,
        confidence,
        extracted,
    })
}

fn parse_extracted(value: &Value) -> ExtractedInfo {
    ExtractedInfo {
        client_name: text_field(value, "client_name"),
        meeting_id: text_field(value, "meeting_id"),
        date: text_field(value, "date"),
    }
}

/// A non-blank string, or a number rendered as one.
fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.trim().is_empty() && s.trim() != "null" => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meetwise_core::error::ProviderError;
    use meetwise_providers::ScriptedProvider;
    use serde_json::json;
    use std::sync::Arc;

    fn recognizer(provider: ScriptedProvider) -> IntentRecognizer {
        IntentRecognizer::new(ModelClient::new(Arc::new(provider), "test"))
    }

    #[tokio::test]
    async fn parses_intent_and_extraction() {
        let r = recognizer(ScriptedProvider::new().on_json(
            "Analyze the intent",
            json!({
                "intent": "summarization",
                "confidence": 0.95,
                "extracted_info": {"client_name": "MTCA", "meeting_id": 123, "date": null}
            }),
        ));
        let intent = r.recognize("Summarize my last MTCA meeting").await.into_value();
        assert_eq!(intent.tool, ToolKind::Summarization);
        assert!((intent.confidence - 0.95).abs() < 1e-6);
        assert_eq!(intent.extracted.client_name.as_deref(), Some("MTCA"));
        assert_eq!(intent.extracted.meeting_id.as_deref(), Some("123"));
        assert!(intent.extracted.date.is_none());
    }

    #[tokio::test]
    async fn unknown_intent_is_general() {
        let r = recognizer(ScriptedProvider::new().on_json("Analyze the intent", json!({"intent": "weather"})));
        let outcome = r.recognize("will it rain?").await;
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.value().tool, ToolKind::General);
        assert!((outcome.value().confidence - 0.5).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn failure_falls_back_to_general() {
        let r = recognizer(ScriptedProvider::new().fail_on("Analyze", ProviderError::Network("down".into())));
        let outcome = r.recognize("prepare me for Acme").await;
        assert!(outcome.is_degraded());
        assert_eq!(outcome.into_value(), Intent::general_fallback());
    }
}
