//! One handle over every context stage, sharing limits and metrics.

use meetwise_core::memory::MemoryRecord;
use meetwise_providers::ModelClient;
use std::sync::Arc;
use tracing::debug;
use crate::delta::{DeltaEngine, DeltaReport};
use crate::injection::{self, GenerationRequest, Placement, SkipReason};
use crate::insights::{InsightSynthesizer, SynthesizedInsights};
use crate::limits::{ContextLimits, WindowPurpose};
use crate::metrics::ContextMetrics;
use crate::outcome::StageOutcome;
use crate::section::{self, ContextSection};
use crate::selector::{PastContextWindow, select_window};

/// The context subsystem as the pipeline and tools see it.
///
/// Every method is infallible: optional stages report degradation through
/// [`StageOutcome`], never through `Result`.
pub struct ContextEngine {
    limits: ContextLimits,
    synthesizer: InsightSynthesizer,
    delta: DeltaEngine,
    metrics: Arc<ContextMetrics>,
}

impl ContextEngine {
    pub fn new(client: ModelClient, limits: ContextLimits) -> Self {
        let metrics = Arc::new(ContextMetrics::new());
        Self {
            synthesizer: InsightSynthesizer::new(client.clone(), limits.insight_field_chars, metrics.clone()),
            delta: DeltaEngine::new(client, limits.delta_category_items, metrics.clone()),
            limits,
            metrics,
        }
    }

    pub fn limits(&self) -> &ContextLimits {
        &self.limits
    }

    pub fn metrics(&self) -> &ContextMetrics {
        &self.metrics
    }

    /// Select a history window for `purpose`.
    pub fn select(&self, records: &[MemoryRecord], purpose: WindowPurpose) -> PastContextWindow {
        let window = select_window(records, &self.limits.window(purpose));
        let truncated = window.truncated_count();
        if truncated > 0 {
            debug!(?purpose, truncated, cap = window.item_cap(), "History items truncated to cap");
            self.metrics.record_items_truncated(truncated);
        }
        debug!(?purpose, selected = window.len(), "Context window selected");
        window
    }

    pub async fn insights(&self, window: &PastContextWindow) -> StageOutcome<SynthesizedInsights> {
        self.synthesizer.synthesize(window).await
    }

    /// Compare `current` with `previous` (most recent first).
    pub async fn delta<S: AsRef<str>>(&self, current: Option<&str>, previous: &[S]) -> StageOutcome<DeltaReport> {
        self.delta.compute(current, previous).await
    }

    pub fn render_insights(&self, insights: &SynthesizedInsights) -> ContextSection {
        let section = section::render_insights(insights, self.limits.insights_section_chars);
        if section.truncated {
            self.metrics.record_section_truncated();
        }
        section
    }

    pub fn render_delta(&self, delta: &DeltaReport) -> ContextSection {
        let section = section::render_delta(delta, self.limits.delta_section_chars);
        if section.truncated {
            self.metrics.record_section_truncated();
        }
        section
    }

    /// Place sections into `request` per the placement table.
    pub fn inject(&self, request: GenerationRequest, sections: &[&ContextSection]) -> (GenerationRequest, Vec<Placement>) {
        let (request, placements) = injection::inject(request, sections);
        for placement in &placements {
            match placement {
                Placement::Insert(_) => self.metrics.record_injected(),
                Placement::Skip(SkipReason::EmptySection) => {}
                Placement::Skip(_) => self.metrics.record_skipped(),
            }
        }
        (request, placements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injection::{OutputContract, SegmentKind};
    use crate::text::char_len;
    use meetwise_providers::ScriptedProvider;
    use serde_json::json;
    use std::time::Duration;

    fn engine(provider: ScriptedProvider) -> (ContextEngine, Arc<ScriptedProvider>) {
        let provider = Arc::new(provider);
        let client = ModelClient::new(provider.clone(), "test").with_timeout(Duration::from_millis(100));
        (ContextEngine::new(client, ContextLimits::default()), provider)
    }

    fn summary(value: &str) -> MemoryRecord {
        MemoryRecord::new("interaction:summarization", value).with_extra("tool_used", "summarization")
    }

    #[tokio::test]
    async fn empty_history_injects_nothing() {
        let (engine, provider) = engine(ScriptedProvider::new().otherwise("{}"));
        let window = engine.select(&[], WindowPurpose::Extraction);
        let insights = engine.insights(&window).await.into_value();
        let section = engine.render_insights(&insights);

        let request = GenerationRequest::new(OutputContract::StructuredJson)
            .segment(SegmentKind::TaskInstruction, "Create a brief.")
            .segment(SegmentKind::MeetingInformation, "Meeting Information:")
            .segment(SegmentKind::SchemaDeclaration, "{}");
        let (injected, _) = engine.inject(request.clone(), &[&section]);

        assert_eq!(insights, SynthesizedInsights::default());
        assert!(section.is_empty());
        assert_eq!(injected.prompt(), request.prompt());
        assert_eq!(provider.call_count(), 0);
        assert_eq!(engine.metrics().snapshot().sections_injected, 0);
    }

    #[tokio::test]
    async fn long_prior_summary_truncated_before_comparison() {
        let (engine, provider) = engine(
            ScriptedProvider::new().on_json("Compare the following", json!({"new_topics": ["pricing"]})),
        );
        let window = engine.select(&[summary(&"x".repeat(3000))], WindowPurpose::Comparison);
        assert_eq!(char_len(window.values().next().unwrap()), 2000);
        assert_eq!(engine.metrics().snapshot().items_truncated, 1);

        let previous: Vec<&str> = window.values().collect();
        let delta = engine.delta(Some("we now talk about pricing"), &previous).await;
        assert_eq!(delta.value().new_topics, vec!["pricing"]);

        let prompt = &provider.requests()[0].messages[0].content;
        assert!(!prompt.contains(&"x".repeat(2001)));
    }

    #[tokio::test]
    async fn section_truncation_is_counted() {
        let (engine, _) = engine(ScriptedProvider::new());
        let insights = SynthesizedInsights {
            communication_style: "a".repeat(500),
            client_history: "b".repeat(500),
            open_loops: "c".repeat(500),
            ..Default::default()
        };
        let section = engine.render_insights(&insights);
        assert_eq!(char_len(&section.content), 1200);
        assert_eq!(engine.metrics().snapshot().sections_truncated, 1);
    }
}
