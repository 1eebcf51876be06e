//! Insight Synthesizer: compresses a context window into five short fields.

use meetwise_providers::{ModelCall, ModelClient};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use crate::metrics::ContextMetrics;
use crate::outcome::{DegradeReason, StageOutcome};
use crate::selector::PastContextWindow;
use crate::text::{sanitize, truncate_chars};

const TEMPERATURE: f32 = 0.4;

/// The five insight fields, in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightField {
    CommunicationStyle,
    ClientHistory,
    RecurringTopics,
    OpenLoops,
    Preferences,
}

impl InsightField {
    pub const ALL: [InsightField; 5] = [
        InsightField::CommunicationStyle,
        InsightField::ClientHistory,
        InsightField::RecurringTopics,
        InsightField::OpenLoops,
        InsightField::Preferences,
    ];

    /// JSON key in the model response.
    pub fn key(&self) -> &'static str {
        match self {
            InsightField::CommunicationStyle => "communication_style",
            InsightField::ClientHistory => "client_history",
            InsightField::RecurringTopics => "recurring_topics",
            InsightField::OpenLoops => "open_loops",
            InsightField::Preferences => "preferences",
        }
    }

    /// Bullet label in the rendered section.
    pub fn label(&self) -> &'static str {
        match self {
            InsightField::CommunicationStyle => "Communication style",
            InsightField::ClientHistory => "Client history",
            InsightField::RecurringTopics => "Recurring topics",
            InsightField::OpenLoops => "Open loops",
            InsightField::Preferences => "Preferences",
        }
    }
}

/// What past interactions say about the user and client. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SynthesizedInsights {
    pub communication_style: String,
    pub client_history: String,
    pub recurring_topics: String,
    pub open_loops: String,
    pub preferences: String,
}

impl SynthesizedInsights {
    pub fn get(&self, field: InsightField) -> &str {
        match field {
            InsightField::CommunicationStyle => &self.communication_style,
            InsightField::ClientHistory => &self.client_history,
            InsightField::RecurringTopics => &self.recurring_topics,
            InsightField::OpenLoops => &self.open_loops,
            InsightField::Preferences => &self.preferences,
        }
    }

    fn slot(&mut self, field: InsightField) -> &mut String {
        match field {
            InsightField::CommunicationStyle => &mut self.communication_style,
            InsightField::ClientHistory => &mut self.client_history,
            InsightField::RecurringTopics => &mut self.recurring_topics,
            InsightField::OpenLoops => &mut self.open_loops,
            InsightField::Preferences => &mut self.preferences,
        }
    }

    /// Fields in rendering order.
    pub fn fields(&self) -> impl Iterator<Item = (InsightField, &str)> {
        InsightField::ALL.into_iter().map(move |field| (field, self.get(field)))
    }

    pub fn is_empty(&self) -> bool {
        self.fields().all(|(_, value)| value.is_empty())
    }

    /// Read the five fields out of a model response.
    ///
    /// Missing or non-string fields become empty; each field is trimmed and
    /// cut to `field_cap` characters. Anything but a JSON object is malformed.
    pub fn from_response(value: &serde_json::Value, field_cap: usize) -> Result<Self, DegradeReason> {
        let object = value.as_object().ok_or_else(|| {
            DegradeReason::MalformedUpstreamResponse("insights response is not a JSON object".into())
        })?;

        let mut insights = Self::default();
        for field in InsightField::ALL {
            let raw = object
                .get(field.key())
                .and_then(|v| v.as_str())
                .map(str::trim)
                .unwrap_or_default();
            *insights.slot(field) = truncate_chars(raw, field_cap).0;
        }
        Ok(insights)
    }
}

/// Runs the single model call that turns history into insights.
pub struct InsightSynthesizer {
    client: ModelClient,
    field_cap: usize,
    metrics: Arc<ContextMetrics>,
}

impl InsightSynthesizer {
    pub fn new(client: ModelClient, field_cap: usize, metrics: Arc<ContextMetrics>) -> Self {
        Self {
            client,
            field_cap,
            metrics,
        }
    }

    /// Synthesize insights from `window`.
    ///
    /// An empty window (or one that sanitizes to nothing) returns empty
    /// insights without calling the model. Any model failure degrades to
    /// empty insights.
    pub async fn synthesize(&self, window: &PastContextWindow) -> StageOutcome<SynthesizedInsights> {
        let items = sanitized_items(window);
        if items.is_empty() {
            debug!("No history for insight synthesis");
            return StageOutcome::Ok(SynthesizedInsights::default());
        }

        let prompt = insights_prompt(&items);
        self.metrics.record_model_call();

        let outcome = match self
            .client
            .json(ModelCall::json(&prompt).temperature(TEMPERATURE))
            .await
        {
            Ok(value) => match SynthesizedInsights::from_response(&value, self.field_cap) {
                Ok(insights) => StageOutcome::Ok(insights),
                Err(reason) => StageOutcome::empty(reason),
            },
            Err(e) => StageOutcome::empty(e),
        };

        if let Some(reason) = outcome.reason() {
            warn!(stage = "synthesize_insights", %reason, "Insight synthesis degraded");
            self.metrics.record_insights_degraded();
        }
        outcome
    }
}

/// Window values sanitized for prompting; blanks dropped, caps re-applied.
fn sanitized_items(window: &PastContextWindow) -> Vec<String> {
    window
        .values()
        .map(sanitize)
        .filter(|item| !item.is_empty())
        .map(|item| truncate_chars(&item, window.item_cap()).0)
        .collect()
}

fn insights_prompt(items: &[String]) -> String {
    let memories = items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze the following past meeting interactions and extract structured insights.

Past Meeting Context:
{memories}

Extract and synthesize the following insights:

1. Communication Style: How does the user typically communicate? What tone, formality level, and writing patterns do you observe?

2. Client History: What patterns emerge about this specific client's prior meetings? What topics, concerns, or themes recur?

3. Recurring Topics: What themes or subjects appear across multiple interactions? What topics are frequently discussed?

4. Open Loops: What commitments, TODOs, or action items were mentioned but may not have been completed? What follow-ups are pending?

5. Preferences: What preferences does the user have for summarization style, follow-up tone, or meeting brief format?

Respond in JSON format:
{{
    "communication_style": "Brief description of communication patterns",
    "client_history": "Patterns about this client's prior meetings",
    "recurring_topics": "Themes that appear across interactions",
    "open_loops": "Pending commitments or TODOs",
    "preferences": "User preferences for tone and format"
}}

If you cannot extract meaningful insights for any field, return an empty string for that field."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::WindowSpec;
    use crate::selector::select_window;
    use crate::text::char_len;
    use meetwise_core::error::ProviderError;
    use meetwise_core::memory::MemoryRecord;
    use meetwise_providers::ScriptedProvider;
    use serde_json::json;
    use std::time::Duration;

    const NEEDLE: &str = "Analyze the following past meeting interactions";

    fn window(values: &[&str]) -> PastContextWindow {
        let records: Vec<MemoryRecord> = values
            .iter()
            .map(|v| MemoryRecord::new("interaction:summarization", *v).with_extra("tool_used", "summarization"))
            .collect();
        select_window(
            &records,
            &WindowSpec {
                tag: "summarization".into(),
                max_count: 3,
                item_cap: 1200,
            },
        )
    }

    fn synthesizer(provider: Arc<ScriptedProvider>) -> (InsightSynthesizer, Arc<ContextMetrics>) {
        let metrics = Arc::new(ContextMetrics::new());
        let client = ModelClient::new(provider, "test").with_timeout(Duration::from_millis(100));
        (InsightSynthesizer::new(client, 500, metrics.clone()), metrics)
    }

    #[tokio::test]
    async fn empty_window_skips_model() {
        let provider = Arc::new(ScriptedProvider::new().otherwise("{}"));
        let (synth, metrics) = synthesizer(provider.clone());

        let outcome = synth.synthesize(&window(&[])).await;
        assert_eq!(outcome, StageOutcome::Ok(SynthesizedInsights::default()));
        assert_eq!(provider.call_count(), 0);
        assert_eq!(metrics.snapshot().model_calls, 0);
    }

    #[tokio::test]
    async fn whitespace_only_window_counts_as_empty() {
        let provider = Arc::new(ScriptedProvider::new().otherwise("{}"));
        let (synth, _) = synthesizer(provider.clone());
        let outcome = synth.synthesize(&window(&["   ", "\n\t"])).await;
        assert!(outcome.value().is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn parses_fields_and_sanitizes_prompt() {
        let provider = Arc::new(ScriptedProvider::new().on_json(
            NEEDLE,
            json!({
                "communication_style": "  Direct and brief  ",
                "client_history": "Acme renewed twice",
                "recurring_topics": "pricing",
                "open_loops": "",
                "preferences": 42
            }),
        ));
        let (synth, metrics) = synthesizer(provider.clone());

        let outcome = synth
            .synthesize(&window(&["Discussed\u{0007}  pricing\n\nwith Acme"]))
            .await;
        let insights = outcome.into_value();
        assert_eq!(insights.communication_style, "Direct and brief");
        assert_eq!(insights.client_history, "Acme renewed twice");
        assert_eq!(insights.open_loops, "");
        assert_eq!(insights.preferences, "");

        let prompt = &provider.requests()[0].messages[0].content;
        assert!(prompt.contains("- Discussed pricing with Acme"));
        assert!((provider.requests()[0].temperature - 0.4).abs() < f32::EPSILON);
        assert_eq!(metrics.snapshot().model_calls, 1);
    }

    #[tokio::test]
    async fn fields_capped_at_field_limit() {
        let long = "z".repeat(900);
        let provider = Arc::new(ScriptedProvider::new().on_json(
            NEEDLE,
            json!({"communication_style": long, "recurring_topics": long}),
        ));
        let (synth, _) = synthesizer(provider);
        let insights = synth.synthesize(&window(&["history"])).await.into_value();
        for (_, value) in insights.fields() {
            assert!(char_len(value) <= 500);
        }
        assert_eq!(char_len(&insights.communication_style), 500);
    }

    #[tokio::test]
    async fn non_object_response_degrades() {
        let provider = Arc::new(ScriptedProvider::new().on_json(NEEDLE, json!(["not", "an", "object"])));
        let (synth, metrics) = synthesizer(provider);
        let outcome = synth.synthesize(&window(&["history"])).await;
        assert!(matches!(
            outcome.reason(),
            Some(DegradeReason::MalformedUpstreamResponse(_))
        ));
        assert!(outcome.value().is_empty());
        assert_eq!(metrics.snapshot().insights_degraded, 1);
    }

    #[tokio::test]
    async fn transport_failure_degrades() {
        let provider = Arc::new(
            ScriptedProvider::new().fail_on(NEEDLE, ProviderError::Network("refused".into())),
        );
        let (synth, _) = synthesizer(provider);
        let outcome = synth.synthesize(&window(&["history"])).await;
        assert!(matches!(outcome.reason(), Some(DegradeReason::UpstreamUnavailable(_))));
        assert!(outcome.value().is_empty());
    }

    #[tokio::test]
    async fn timeout_degrades() {
        let provider = Arc::new(ScriptedProvider::new().stall_on(NEEDLE, Duration::from_secs(10)));
        let (synth, _) = synthesizer(provider);
        let outcome = synth.synthesize(&window(&["history"])).await;
        assert!(matches!(outcome.reason(), Some(DegradeReason::UpstreamUnavailable(_))));
    }
}
