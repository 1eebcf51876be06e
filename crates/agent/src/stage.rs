//! Pipeline stages, their statuses and the per-turn record of both.

use meetwise_core::event::{DomainEvent, EventBus};
use serde::Serialize;
use std::time::Instant;

/// Every stage of a turn, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    RecognizeIntent,
    PlanWorkflow,
    RetrieveMemory,
    FetchIntegrationData,
    SelectContextWindow,
    SynthesizeInsights,
    ComputeDelta,
    BuildContextSection,
    ExecuteTool,
    AnnotateArtifact,
    WriteMemory,
}

impl Stage {
    pub const ALL: [Stage; 11] = [
        Stage::RecognizeIntent,
        Stage::PlanWorkflow,
        Stage::RetrieveMemory,
        Stage::FetchIntegrationData,
        Stage::SelectContextWindow,
        Stage::SynthesizeInsights,
        Stage::ComputeDelta,
        Stage::BuildContextSection,
        Stage::ExecuteTool,
        Stage::AnnotateArtifact,
        Stage::WriteMemory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::RecognizeIntent => "recognize_intent",
            Stage::PlanWorkflow => "plan_workflow",
            Stage::RetrieveMemory => "retrieve_memory",
            Stage::FetchIntegrationData => "fetch_integration_data",
            Stage::SelectContextWindow => "select_context_window",
            Stage::SynthesizeInsights => "synthesize_insights",
            Stage::ComputeDelta => "compute_delta",
            Stage::BuildContextSection => "build_context_section",
            Stage::ExecuteTool => "execute_tool",
            Stage::AnnotateArtifact => "annotate_artifact",
            Stage::WriteMemory => "write_memory",
        }
    }

    /// Whether a degradation here makes the whole turn degraded.
    pub fn degrades_turn(&self) -> bool {
        matches!(
            self,
            Stage::RetrieveMemory
                | Stage::SelectContextWindow
                | Stage::SynthesizeInsights
                | Stage::ComputeDelta
                | Stage::BuildContextSection
                | Stage::AnnotateArtifact
                | Stage::WriteMemory
        )
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    /// Did not apply to this turn
    Skipped(String),
    /// Ran, failed, and fell back to an empty value
    Degraded(String),
    /// Ran and failed the turn
    Failed(String),
}

impl StageStatus {
    pub fn skipped(reason: impl Into<String>) -> Self {
        StageStatus::Skipped(reason.into())
    }

    pub fn degraded(reason: impl std::fmt::Display) -> Self {
        StageStatus::Degraded(reason.to_string())
    }

    pub fn failed(reason: impl std::fmt::Display) -> Self {
        StageStatus::Failed(reason.to_string())
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, StageStatus::Degraded(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            StageStatus::Completed => "completed",
            StageStatus::Skipped(_) => "skipped",
            StageStatus::Degraded(_) => "degraded",
            StageStatus::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,
    pub duration_ms: u64,
}

/// How a turn ended. There is no failed terminal: a failed turn returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Completed,
    CompletedDegraded,
}

impl TurnStatus {
    pub fn from_stages(stages: &[StageRecord]) -> Self {
        if stages
            .iter()
            .any(|r| r.stage.degrades_turn() && r.status.is_degraded())
        {
            TurnStatus::CompletedDegraded
        } else {
            TurnStatus::Completed
        }
    }
}

impl std::fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnStatus::Completed => f.write_str("COMPLETED"),
            TurnStatus::CompletedDegraded => f.write_str("COMPLETED_DEGRADED"),
        }
    }
}

/// Collects stage records for one turn and publishes each as it finishes.
pub(crate) struct StageLog<'a> {
    events: &'a EventBus,
    records: Vec<StageRecord>,
}

impl<'a> StageLog<'a> {
    pub(crate) fn new(events: &'a EventBus) -> Self {
        Self {
            events,
            records: Vec::with_capacity(Stage::ALL.len()),
        }
    }

    pub(crate) fn finish(&mut self, stage: Stage, status: StageStatus, started: Instant) {
        let duration_ms = started.elapsed().as_millis() as u64;
        self.events.publish(DomainEvent::StageFinished {
            stage: stage.to_string(),
            status: status.label().to_string(),
            duration_ms,
            timestamp: chrono::Utc::now(),
        });
        self.records.push(StageRecord {
            stage,
            status,
            duration_ms,
        });
    }

    pub(crate) fn into_records(self) -> Vec<StageRecord> {
        self.records
    }
}
