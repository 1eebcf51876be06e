//! Delta Engine: what changed between a summary and the ones before it.

use meetwise_providers::{ModelCall, ModelClient};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use crate::metrics::ContextMetrics;
use crate::outcome::{DegradeReason, StageOutcome};
use crate::text::normalize_for_comparison;

const TEMPERATURE: f32 = 0.3;

/// The six delta categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaCategory {
    NewTopics,
    RemovedTopics,
    RepeatedTopics,
    NewDecisions,
    BlockersAdded,
    BlockersResolved,
}

impl DeltaCategory {
    pub const ALL: [DeltaCategory; 6] = [
        DeltaCategory::NewTopics,
        DeltaCategory::RemovedTopics,
        DeltaCategory::RepeatedTopics,
        DeltaCategory::NewDecisions,
        DeltaCategory::BlockersAdded,
        DeltaCategory::BlockersResolved,
    ];

    /// Categories that appear in a rendered section, in order.
    /// Repeated topics are computed but never shown.
    pub const RENDERED: [DeltaCategory; 5] = [
        DeltaCategory::NewTopics,
        DeltaCategory::RemovedTopics,
        DeltaCategory::NewDecisions,
        DeltaCategory::BlockersAdded,
        DeltaCategory::BlockersResolved,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            DeltaCategory::NewTopics => "new_topics",
            DeltaCategory::RemovedTopics => "removed_topics",
            DeltaCategory::RepeatedTopics => "repeated_topics",
            DeltaCategory::NewDecisions => "new_decisions",
            DeltaCategory::BlockersAdded => "blockers_added",
            DeltaCategory::BlockersResolved => "blockers_resolved",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeltaCategory::NewTopics => "New topics",
            DeltaCategory::RemovedTopics => "Removed topics",
            DeltaCategory::RepeatedTopics => "Repeated topics",
            DeltaCategory::NewDecisions => "Updated decisions",
            DeltaCategory::BlockersAdded => "New blockers",
            DeltaCategory::BlockersResolved => "Resolved blockers",
        }
    }
}

/// Categorized differences between two summaries. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeltaReport {
    pub new_topics: Vec<String>,
    pub removed_topics: Vec<String>,
    pub repeated_topics: Vec<String>,
    pub new_decisions: Vec<String>,
    pub blockers_added: Vec<String>,
    pub blockers_resolved: Vec<String>,
}

impl DeltaReport {
    pub fn get(&self, category: DeltaCategory) -> &[String] {
        match category {
            DeltaCategory::NewTopics => &self.new_topics,
            DeltaCategory::RemovedTopics => &self.removed_topics,
            DeltaCategory::RepeatedTopics => &self.repeated_topics,
            DeltaCategory::NewDecisions => &self.new_decisions,
            DeltaCategory::BlockersAdded => &self.blockers_added,
            DeltaCategory::BlockersResolved => &self.blockers_resolved,
        }
    }

    fn slot(&mut self, category: DeltaCategory) -> &mut Vec<String> {
        match category {
            DeltaCategory::NewTopics => &mut self.new_topics,
            DeltaCategory::RemovedTopics => &mut self.removed_topics,
            DeltaCategory::RepeatedTopics => &mut self.repeated_topics,
            DeltaCategory::NewDecisions => &mut self.new_decisions,
            DeltaCategory::BlockersAdded => &mut self.blockers_added,
            DeltaCategory::BlockersResolved => &mut self.blockers_resolved,
        }
    }

    pub fn is_empty(&self) -> bool {
        DeltaCategory::ALL.iter().all(|c| self.get(*c).is_empty())
    }

    /// Read the six categories out of a model response.
    ///
    /// A category that is missing or not an array of strings is empty;
    /// blank items are dropped; each category keeps the first `max_items`
    /// in the order the model returned them.
    pub fn from_response(value: &serde_json::Value, max_items: usize) -> Result<Self, DegradeReason> {
        let object = value.as_object().ok_or_else(|| {
            DegradeReason::MalformedUpstreamResponse("delta response is not a JSON object".into())
        })?;

        let mut report = Self::default();
        for category in DeltaCategory::ALL {
            *report.slot(category) = object
                .get(category.key())
                .map(|v| string_items(v, max_items))
                .unwrap_or_default();
        }
        Ok(report)
    }
}

/// Strings of a JSON array, or nothing if any element is not a string.
fn string_items(value: &serde_json::Value, max_items: usize) -> Vec<String> {
    let Some(array) = value.as_array() else {
        return Vec::new();
    };
    let strings: Option<Vec<&str>> = array.iter().map(|v| v.as_str()).collect();
    strings
        .unwrap_or_default()
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(max_items)
        .map(String::from)
        .collect()
}

/// Runs the single model call that classifies differences.
pub struct DeltaEngine {
    client: ModelClient,
    max_items: usize,
    metrics: Arc<ContextMetrics>,
}

impl DeltaEngine {
    pub fn new(client: ModelClient, max_items: usize, metrics: Arc<ContextMetrics>) -> Self {
        Self {
            client,
            max_items,
            metrics,
        }
    }

    /// Compare `current` against `previous` (most recent first).
    ///
    /// Without a current text or any previous text the report is empty and
    /// the model is not called. Any model failure degrades to an empty report.
    pub async fn compute<S: AsRef<str>>(&self, current: Option<&str>, previous: &[S]) -> StageOutcome<DeltaReport> {
        let current = current.map(normalize_for_comparison).unwrap_or_default();
        let previous: Vec<String> = previous
            .iter()
            .map(|p| normalize_for_comparison(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();

        if current.is_empty() || previous.is_empty() {
            debug!("Nothing to compare for delta");
            return StageOutcome::Ok(DeltaReport::default());
        }

        let prompt = delta_prompt(&current, &previous);
        self.metrics.record_model_call();

        let outcome = match self
            .client
            .json(ModelCall::json(&prompt).temperature(TEMPERATURE))
            .await
        {
            Ok(value) => match DeltaReport::from_response(&value, self.max_items) {
                Ok(report) => StageOutcome::Ok(report),
                Err(reason) => StageOutcome::empty(reason),
            },
            Err(e) => StageOutcome::empty(e),
        };

        if let Some(reason) = outcome.reason() {
            warn!(stage = "compute_delta", %reason, "Delta computation degraded");
            self.metrics.record_delta_degraded();
        }
        outcome
    }
}

fn delta_prompt(current: &str, previous: &[String]) -> String {
    let previous_block = previous
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let label = if i == 0 {
                "Previous Meeting Summary (most recent):".to_string()
            } else {
                format!("Earlier Meeting Summary ({} back):", i + 1)
            };
            format!("{label}\n{text}")
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"Compare the following meeting summaries and identify what changed.

{previous_block}

Current Meeting Summary:
{current}

Identify and extract:
1. New topics: Topics or themes introduced in the current meeting that were not in the previous meetings
2. Removed topics: Topics from the previous meetings that are no longer mentioned in the current meeting
3. Repeated topics: Topics that appear in both (continuation of ongoing discussions)
4. New decisions: Decisions made in the current meeting that were not in the previous meetings
5. Blockers added: New blockers, obstacles, or issues mentioned in the current meeting
6. Blockers resolved: Blockers from the previous meetings that appear to be resolved in the current meeting

For each category, extract specific, concise items, most important first. If a category has no items, return an empty list.

Respond in JSON format:
{{
    "new_topics": ["topic 1", "topic 2"],
    "removed_topics": ["topic 1", "topic 2"],
    "repeated_topics": ["topic 1", "topic 2"],
    "new_decisions": ["decision 1", "decision 2"],
    "blockers_added": ["blocker 1", "blocker 2"],
    "blockers_resolved": ["blocker 1", "blocker 2"]
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use meetwise_core::error::ProviderError;
    use meetwise_providers::ScriptedProvider;
    use serde_json::json;
    use std::time::Duration;

    const NEEDLE: &str = "Compare the following meeting summaries";

    fn engine(provider: Arc<ScriptedProvider>) -> (DeltaEngine, Arc<ContextMetrics>) {
        let metrics = Arc::new(ContextMetrics::new());
        let client = ModelClient::new(provider, "test").with_timeout(Duration::from_millis(100));
        (DeltaEngine::new(client, 5, metrics.clone()), metrics)
    }

    #[tokio::test]
    async fn no_current_skips_model() {
        let provider = Arc::new(ScriptedProvider::new().otherwise("{}"));
        let (engine, _) = engine(provider.clone());
        let outcome = engine.compute(None, &["last week"]).await;
        assert_eq!(outcome, StageOutcome::Ok(DeltaReport::default()));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn no_previous_skips_model() {
        let provider = Arc::new(ScriptedProvider::new().otherwise("{}"));
        let (engine, _) = engine(provider.clone());
        let none: [&str; 0] = [];
        assert!(engine.compute(Some("this week"), &none).await.value().is_empty());
        assert!(engine.compute(Some("this week"), &["  "]).await.value().is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn prompt_uses_normalized_texts_newest_first() {
        let provider = Arc::new(ScriptedProvider::new().on_json(NEEDLE, json!({})));
        let (engine, metrics) = engine(provider.clone());
        engine
            .compute(Some("## Outline:\n- Budget"), &["- Hiring", "1. Launch"])
            .await;

        let prompt = &provider.requests()[0].messages[0].content;
        assert!(prompt.contains("Current Meeting Summary:\noutline: budget"));
        assert!(prompt.contains("Previous Meeting Summary (most recent):\nhiring"));
        assert!(prompt.contains("Earlier Meeting Summary (2 back):\nlaunch"));
        assert!((provider.requests()[0].temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(metrics.snapshot().model_calls, 1);
    }

    #[tokio::test]
    async fn categories_capped_in_model_order() {
        let provider = Arc::new(ScriptedProvider::new().on_json(
            NEEDLE,
            json!({
                "new_topics": ["a", "b", "c", "d", "e", "f", "g"],
                "repeated_topics": ["budget"],
                "blockers_resolved": ["vendor delay"]
            }),
        ));
        let (engine, _) = engine(provider);
        let report = engine.compute(Some("now"), &["then"]).await.into_value();
        assert_eq!(report.new_topics, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(report.repeated_topics, vec!["budget"]);
        assert_eq!(report.blockers_resolved, vec!["vendor delay"]);
        assert!(report.removed_topics.is_empty());
    }

    #[tokio::test]
    async fn malformed_category_is_empty_not_error() {
        let provider = Arc::new(ScriptedProvider::new().on_json(
            NEEDLE,
            json!({
                "new_topics": "pricing",
                "removed_topics": ["ok", 3],
                "new_decisions": ["ship v2", "   "],
            }),
        ));
        let (engine, _) = engine(provider);
        let outcome = engine.compute(Some("now"), &["then"]).await;
        assert!(!outcome.is_degraded());
        let report = outcome.into_value();
        assert!(report.new_topics.is_empty());
        assert!(report.removed_topics.is_empty());
        assert_eq!(report.new_decisions, vec!["ship v2"]);
    }

    #[tokio::test]
    async fn failures_degrade_to_empty() {
        let provider = Arc::new(
            ScriptedProvider::new().fail_on(NEEDLE, ProviderError::AuthenticationFailed("bad key".into())),
        );
        let (delta, metrics) = engine(provider);
        let outcome = delta.compute(Some("now"), &["then"]).await;
        assert!(outcome.is_degraded());
        assert!(outcome.value().is_empty());
        assert_eq!(metrics.snapshot().deltas_degraded, 1);

        let provider = Arc::new(ScriptedProvider::new().on(NEEDLE, "no json here"));
        let (delta, _) = engine(provider);
        let outcome = delta.compute(Some("now"), &["then"]).await;
        assert!(matches!(
            outcome.reason(),
            Some(DegradeReason::MalformedUpstreamResponse(_))
        ));
    }

    #[tokio::test]
    async fn timeout_degrades() {
        let provider = Arc::new(ScriptedProvider::new().stall_on(NEEDLE, Duration::from_secs(10)));
        let (engine, _) = engine(provider);
        let outcome = engine.compute(Some("now"), &["then"]).await;
        assert!(matches!(outcome.reason(), Some(DegradeReason::UpstreamUnavailable(_))));
    }
}
