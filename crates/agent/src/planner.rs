//! Workflow planning: an informational step list for the turn report.

use meetwise_context::StageOutcome;
use meetwise_core::intent::Intent;
use meetwise_providers::{ModelCall, ModelClient};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = r#"You are a workflow planning system. Based on the user's intent and context,
plan the workflow steps needed to fulfill their request.

Respond in JSON format with a structured workflow plan. Each step is an object with:
- "action": a machine-readable action identifier (e.g., "find_meeting", "retrieve_transcript", "summarize", "generate_followup", "generate_brief", "retrieve_memory")
- "tool": the tool that executes the step (e.g., "meeting_finder", "integration_fetcher", "summarization", "followup", "meeting_brief", "memory_retriever")
- "prerequisites" (optional): data keys that must exist before the step runs
- "fallback" (optional): an object {"if": condition, "then": action} describing what to do if the step fails

Root level fields:
- "steps": array of step objects (required)
- "required_data": data keys the whole workflow needs (optional)

Steps must be ordered sequentially. Each step may depend on data produced by previous steps."#;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowPlan {
    #[serde(default)]
    pub steps: Vec<PlanStep>,
    #[serde(default)]
    pub required_data: Vec<String>,
}

impl WorkflowPlan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

pub struct WorkflowPlanner {
    client: ModelClient,
}

impl WorkflowPlanner {
    pub fn new(client: ModelClient) -> Self {
        Self { client }
    }

    /// Plan the turn. Any failure yields an empty plan.
    pub async fn plan(&self, intent: &Intent, message: &str, session: &str) -> StageOutcome<WorkflowPlan> {
        let prompt = format!(
            "Intent: {}\nUser Message: {message}\nContext: Session: {session}\n\nPlan the workflow and respond in JSON format.",
            intent.tool
        );
        let call = ModelCall::json(&prompt).system(SYSTEM_PROMPT).temperature(0.4);

        let outcome = match self.client.json(call).await {
            Ok(value) => match serde_json::from_value::<WorkflowPlan>(value) {
                Ok(plan) => StageOutcome::Ok(plan),
                Err(e) => StageOutcome::empty(meetwise_context::DegradeReason::MalformedUpstreamResponse(
                    e.to_string(),
                )),
            },
            Err(e) => StageOutcome::empty(e),
        };

        match outcome.reason() {
            Some(reason) => warn!(stage = "plan_workflow", %reason, "Continuing without a plan"),
            None => debug!(steps = outcome.value().steps.len(), "Workflow planned"),
        }
        outcome
    }
}
