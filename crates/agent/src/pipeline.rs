//! The pipeline sequencer: runs every stage of a turn in fixed order.
//!
//! Only `ExecuteTool` can fail a turn. Every other stage records a status
//! and hands the next stage an empty value when it could not do its job.

use meetwise_config::{AppConfig, ContextConfig};
use meetwise_context::{
    ContextEngine, ContextLimits, ContextSection, DeltaReport, MetricsSnapshot, PastContextWindow, Placement,
    SectionOrigin, StageOutcome, SynthesizedInsights, WindowPurpose,
};
use meetwise_core::error::{IntegrationError, ToolError};
use meetwise_core::event::{DomainEvent, EventBus};
use meetwise_core::integration::{IntegrationQuery, IntegrationSource, MeetingData, NoIntegrations};
use meetwise_core::intent::Intent;
use meetwise_core::memory::{MemoryRecord, MemoryStore, SessionId};
use meetwise_core::tool::ToolKind;
use meetwise_providers::ModelClient;
use meetwise_tools::{Artifact, ToolInput, ToolSet};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::intent::IntentRecognizer;
use crate::planner::{WorkflowPlan, WorkflowPlanner};
use crate::stage::{Stage, StageLog, StageRecord, StageStatus, TurnStatus};
use crate::synthesis::render_response;
use crate::writer::{MemoryWriter, TurnMemory};

/// The only error a turn can surface.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("tool execution failed: {0}")]
    ExecuteTool(#[from] ToolError),
}

/// Behavior switches for the context stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Compare a fresh summary against past ones and append the result
    pub post_hoc_delta: bool,
    /// Run insight synthesis and delta computation at the same time
    pub concurrent_synthesis: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            post_hoc_delta: true,
            concurrent_synthesis: true,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &ContextConfig) -> Self {
        Self {
            post_hoc_delta: config.post_hoc_delta,
            concurrent_synthesis: config.concurrent_synthesis,
        }
    }
}

/// One incoming user turn.
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub session: SessionId,
    pub message: String,
    /// A meeting the user picked explicitly
    pub selected_meeting: Option<String>,
    pub additional_context: Option<String>,
}

impl TurnRequest {
    pub fn new(session: SessionId, message: impl Into<String>) -> Self {
        Self {
            session,
            message: message.into(),
            ..Default::default()
        }
    }
}

/// Where one context section went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InjectionRecord {
    pub origin: SectionOrigin,
    pub placement: Placement,
}

/// Everything a finished turn produced.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReport {
    pub response: String,
    pub artifact: Artifact,
    pub intent: Intent,
    pub plan: WorkflowPlan,
    pub stages: Vec<StageRecord>,
    pub injections: Vec<InjectionRecord>,
    pub status: TurnStatus,
    pub metrics: MetricsSnapshot,
    pub duration_ms: u64,
}

impl TurnReport {
    pub fn stage(&self, stage: Stage) -> Option<&StageStatus> {
        self.stages.iter().find(|r| r.stage == stage).map(|r| &r.status)
    }
}

/// Context produced ahead of generation.
struct PreparedContext {
    insights: ContextSection,
    delta: Option<ContextSection>,
    comparison: PastContextWindow,
}

pub struct Pipeline {
    recognizer: IntentRecognizer,
    planner: WorkflowPlanner,
    writer: MemoryWriter,
    tools: ToolSet,
    context: ContextEngine,
    store: Arc<dyn MemoryStore>,
    integrations: Arc<dyn IntegrationSource>,
    events: Arc<EventBus>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(client: ModelClient, store: Arc<dyn MemoryStore>, limits: ContextLimits) -> Self {
        Self {
            recognizer: IntentRecognizer::new(client.clone()),
            planner: WorkflowPlanner::new(client.clone()),
            writer: MemoryWriter::new(store.clone(), client.clone()),
            tools: ToolSet::standard(client.clone()),
            context: ContextEngine::new(client, limits),
            store,
            integrations: Arc::new(NoIntegrations),
            events: Arc::new(EventBus::default()),
            options: PipelineOptions::default(),
        }
    }

    pub fn from_config(config: &AppConfig, client: ModelClient, store: Arc<dyn MemoryStore>) -> Self {
        Self::new(client, store, ContextLimits::from_config(&config.context))
            .with_options(PipelineOptions::from_config(&config.context))
    }

    pub fn with_integrations(mut self, integrations: Arc<dyn IntegrationSource>) -> Self {
        self.integrations = integrations;
        self
    }

    pub fn with_tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn context(&self) -> &ContextEngine {
        &self.context
    }

    /// Run one turn through every stage.
    pub async fn run_turn(&self, request: TurnRequest) -> Result<TurnReport, PipelineError> {
        let turn_started = Instant::now();
        let mut log = StageLog::new(&self.events);
        info!(session = %request.session, "Processing turn");

        // ── Intent and plan ──────────────────────────────────────────
        let started = Instant::now();
        let (intent, reason) = self.recognizer.recognize(&request.message).await.into_parts();
        log.finish(Stage::RecognizeIntent, status_of(reason), started);
        let tool = intent.tool;

        let started = Instant::now();
        let (plan, reason) = self
            .planner
            .plan(&intent, &request.message, request.session.as_str())
            .await
            .into_parts();
        log.finish(Stage::PlanWorkflow, status_of(reason), started);

        // ── Inputs ───────────────────────────────────────────────────
        let started = Instant::now();
        let (records, history) = match self.store.query(&request.session).await {
            Ok(records) => {
                log.finish(Stage::RetrieveMemory, StageStatus::Completed, started);
                (records, "no history")
            }
            Err(e) => {
                warn!(stage = "retrieve_memory", error = %e, "Continuing without history");
                log.finish(Stage::RetrieveMemory, StageStatus::degraded(e), started);
                (Vec::new(), "history unavailable")
            }
        };

        let started = Instant::now();
        let (meeting, status) = self.fetch_meeting(tool, &intent, &request).await;
        log.finish(Stage::FetchIntegrationData, status, started);

        // ── Context ──────────────────────────────────────────────────
        let prepared = self.prepare_context(tool, &records, history, &mut log).await;

        // ── Generation ───────────────────────────────────────────────
        let started = Instant::now();
        let input = ToolInput {
            meeting,
            user_message: request.message.clone(),
            additional_context: request.additional_context.clone(),
        };
        let (artifact, injections) = match self.execute_tool(tool, &input, &prepared).await {
            Ok(done) => {
                log.finish(Stage::ExecuteTool, StageStatus::Completed, started);
                done
            }
            Err(e) => {
                warn!(stage = "execute_tool", %tool, error = %e, "Turn failed");
                log.finish(Stage::ExecuteTool, StageStatus::failed(&e), started);
                return Err(e.into());
            }
        };

        let started = Instant::now();
        let (annotation, status) = self.annotate(&artifact, &prepared.comparison).await;
        log.finish(Stage::AnnotateArtifact, status, started);

        let response = render_response(&artifact, annotation.as_ref());

        // ── Memory ───────────────────────────────────────────────────
        let started = Instant::now();
        let artifact_text = artifact.memory_value();
        let turn = TurnMemory {
            tool: artifact.tool(),
            intent: tool,
            user_message: &request.message,
            artifact_text: &artifact_text,
            response: &response,
        };
        let (_, reason) = self.writer.write(&request.session, &turn).await.into_parts();
        log.finish(Stage::WriteMemory, status_of(reason), started);

        let stages = log.into_records();
        let status = TurnStatus::from_stages(&stages);
        let duration_ms = turn_started.elapsed().as_millis() as u64;

        self.events.publish(DomainEvent::TurnCompleted {
            session: request.session.to_string(),
            tool: tool.to_string(),
            degraded: status == TurnStatus::CompletedDegraded,
            duration_ms,
            timestamp: chrono::Utc::now(),
        });
        info!(session = %request.session, %tool, %status, duration_ms, "Turn completed");

        Ok(TurnReport {
            response,
            artifact,
            intent,
            plan,
            stages,
            injections,
            status,
            metrics: self.context.metrics().snapshot(),
            duration_ms,
        })
    }

    async fn fetch_meeting(&self, tool: ToolKind, intent: &Intent, request: &TurnRequest) -> (MeetingData, StageStatus) {
        if !tool.needs_meeting_data() {
            return (MeetingData::default(), StageStatus::skipped("not needed for general replies"));
        }

        let query = IntegrationQuery {
            tool,
            extracted: intent.extracted.clone(),
            selected_meeting: request.selected_meeting.clone(),
        };
        match self.integrations.fetch(&query).await {
            Ok(meeting) => (meeting, StageStatus::Completed),
            Err(IntegrationError::NotConfigured(source)) => {
                (MeetingData::default(), StageStatus::skipped(format!("no integrations configured ({source})")))
            }
            Err(e) => {
                warn!(stage = "fetch_integration_data", source = self.integrations.name(), error = %e, "Continuing without meeting data");
                (MeetingData::default(), StageStatus::degraded(e))
            }
        }
    }

    /// Select, synthesize and render whatever context this tool can use.
    /// `empty_reason` labels the skipped stages when `records` is empty.
    async fn prepare_context(
        &self,
        tool: ToolKind,
        records: &[MemoryRecord],
        empty_reason: &str,
        log: &mut StageLog<'_>,
    ) -> PreparedContext {
        let started = Instant::now();
        if !tool.needs_meeting_data() {
            for stage in [
                Stage::SelectContextWindow,
                Stage::SynthesizeInsights,
                Stage::ComputeDelta,
                Stage::BuildContextSection,
            ] {
                log.finish(stage, StageStatus::skipped(format!("not used by {tool}")), started);
            }
            return PreparedContext {
                insights: ContextSection::empty(SectionOrigin::Insights, self.context.limits().insights_section_chars),
                delta: None,
                comparison: PastContextWindow::default(),
            };
        }

        let extraction = self.context.select(records, WindowPurpose::Extraction);
        let comparison = if self.uses_delta(tool) {
            self.context.select(records, WindowPurpose::Comparison)
        } else {
            PastContextWindow::default()
        };
        let window_status = if extraction.is_empty() && comparison.is_empty() {
            StageStatus::skipped(empty_reason)
        } else {
            StageStatus::Completed
        };
        log.finish(Stage::SelectContextWindow, window_status, started);

        // Briefs compare the latest past summary against the ones before it.
        let pre_delta = tool == ToolKind::MeetingBrief;
        let current = comparison.most_recent().map(|item| item.value.as_str()).filter(|_| pre_delta);
        let previous: Vec<&str> = if pre_delta {
            comparison.older().iter().map(|item| item.value.as_str()).collect()
        } else {
            Vec::new()
        };

        let started = Instant::now();
        let insights_fut = self.context.insights(&extraction);
        let delta_fut = self.context.delta(current, previous.as_slice());
        let (insights, delta) = if self.options.concurrent_synthesis {
            tokio::join!(insights_fut, delta_fut)
        } else {
            let insights = insights_fut.await;
            (insights, delta_fut.await)
        };

        let insights_status = if extraction.is_empty() {
            StageStatus::skipped(empty_reason)
        } else {
            outcome_status(&insights)
        };
        log.finish(Stage::SynthesizeInsights, insights_status, started);

        let delta_status = match tool {
            ToolKind::MeetingBrief if current.is_none() || previous.is_empty() => {
                StageStatus::skipped("fewer than two past summaries")
            }
            ToolKind::MeetingBrief => outcome_status(&delta),
            ToolKind::Summarization if self.options.post_hoc_delta => StageStatus::skipped("runs after generation"),
            ToolKind::Summarization => StageStatus::skipped("post-hoc delta disabled"),
            other => StageStatus::skipped(format!("not used by {other}")),
        };
        log.finish(Stage::ComputeDelta, delta_status, started);

        let started = Instant::now();
        let insights: SynthesizedInsights = insights.into_value();
        let insights_section = self.context.render_insights(&insights);
        let delta_section = pre_delta.then(|| {
            let report: DeltaReport = delta.into_value();
            self.context.render_delta(&report)
        });
        let build_status = if insights_section.is_empty() && delta_section.as_ref().is_none_or(|d| d.is_empty()) {
            StageStatus::skipped("nothing to inject")
        } else {
            StageStatus::Completed
        };
        log.finish(Stage::BuildContextSection, build_status, started);

        PreparedContext {
            insights: insights_section,
            delta: delta_section,
            comparison,
        }
    }

    fn uses_delta(&self, tool: ToolKind) -> bool {
        match tool {
            ToolKind::MeetingBrief => true,
            ToolKind::Summarization => self.options.post_hoc_delta,
            _ => false,
        }
    }

    async fn execute_tool(
        &self,
        tool: ToolKind,
        input: &ToolInput,
        prepared: &PreparedContext,
    ) -> Result<(Artifact, Vec<InjectionRecord>), ToolError> {
        let generator = self.tools.get(tool)?;
        let request = generator.build_request(input)?;

        let mut sections = vec![&prepared.insights];
        if let Some(delta) = &prepared.delta {
            sections.push(delta);
        }
        let (request, placements) = self.context.inject(request, &sections);

        let injections: Vec<InjectionRecord> = sections
            .iter()
            .zip(placements)
            .map(|(section, placement)| {
                if let Placement::Insert(position) = placement {
                    self.events.publish(DomainEvent::ContextInjected {
                        tool: tool.to_string(),
                        origin: section.origin.to_string(),
                        chars: section.content.chars().count(),
                        position,
                        timestamp: chrono::Utc::now(),
                    });
                }
                InjectionRecord {
                    origin: section.origin,
                    placement,
                }
            })
            .collect();

        let artifact = generator.generate(request, input).await?;
        Ok((artifact, injections))
    }

    /// Post-hoc delta: compare a fresh summary with the past ones.
    ///
    /// The generation request is never touched; the delta only annotates
    /// the response.
    async fn annotate(&self, artifact: &Artifact, comparison: &PastContextWindow) -> (Option<ContextSection>, StageStatus) {
        let Some(summary) = artifact.summary_text() else {
            return (None, StageStatus::skipped(format!("not used by {}", artifact.tool())));
        };
        if !self.options.post_hoc_delta {
            return (None, StageStatus::skipped("post-hoc delta disabled"));
        }
        if comparison.is_empty() {
            return (None, StageStatus::skipped("no previous summaries"));
        }

        let previous: Vec<&str> = comparison.values().collect();
        let outcome = self.context.delta(Some(summary), previous.as_slice()).await;
        let status = outcome_status(&outcome);
        let section = self.context.render_delta(outcome.value());
        (Some(section).filter(|s| !s.is_empty()), status)
    }
}

fn status_of(reason: Option<meetwise_context::DegradeReason>) -> StageStatus {
    match reason {
        Some(reason) => StageStatus::degraded(reason),
        None => StageStatus::Completed,
    }
}

fn outcome_status<T>(outcome: &StageOutcome<T>) -> StageStatus {
    match outcome.reason() {
        Some(reason) => StageStatus::degraded(reason),
        None => StageStatus::Completed,
    }
}
