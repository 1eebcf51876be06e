//! Memory writing: one interaction record per turn, then extracted facts.

use meetwise_context::{DegradeReason, StageOutcome};
use meetwise_core::memory::{MemoryCategory, MemoryRecord, MemoryStore, SessionId};
use meetwise_core::tool::ToolKind;
use meetwise_providers::{ModelCall, ModelClient};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "Extract key information from conversations that should be stored in memory \
for future reference. Focus on facts, preferences, and important context.";

/// What one turn leaves behind.
#[derive(Debug, Clone)]
pub struct TurnMemory<'a> {
    pub tool: ToolKind,
    pub intent: ToolKind,
    pub user_message: &'a str,
    /// Stored as the interaction record's value
    pub artifact_text: &'a str,
    /// The full user-facing response
    pub response: &'a str,
}

pub struct MemoryWriter {
    store: Arc<dyn MemoryStore>,
    client: ModelClient,
}

impl MemoryWriter {
    pub fn new(store: Arc<dyn MemoryStore>, client: ModelClient) -> Self {
        Self { store, client }
    }

    /// Write the turn to memory. Returns how many records were appended.
    pub async fn write(&self, session: &SessionId, turn: &TurnMemory<'_>) -> StageOutcome<usize> {
        let interaction = MemoryRecord::new(format!("interaction:{}", turn.tool), turn.artifact_text)
            .with_extra("tool_used", turn.tool.as_str())
            .with_extra("intent", turn.intent.as_str())
            .with_extra("user_message", turn.user_message)
            .with_extra("response_length", turn.response.chars().count());

        if let Err(e) = self.store.append(session, interaction).await {
            warn!(stage = "write_memory", store = self.store.name(), error = %e, "Interaction record not written");
            return StageOutcome::degraded(0, DegradeReason::UpstreamUnavailable(e.to_string()));
        }

        let facts = match self.extract_facts(turn).await {
            Ok(facts) => facts,
            Err(reason) => {
                warn!(stage = "write_memory", %reason, "Fact extraction degraded");
                return StageOutcome::degraded(1, reason);
            }
        };

        let mut written = 1;
        for (key, value) in facts {
            if let Err(e) = self.store.append(session, MemoryRecord::new(key, value)).await {
                warn!(stage = "write_memory", error = %e, "Fact record not written");
                return StageOutcome::degraded(written, DegradeReason::UpstreamUnavailable(e.to_string()));
            }
            written += 1;
        }
        debug!(session = %session, written, "Turn written to memory");
        StageOutcome::Ok(written)
    }

    async fn extract_facts(&self, turn: &TurnMemory<'_>) -> Result<Vec<(String, String)>, DegradeReason> {
        let prompt = fact_prompt(turn);
        let value = self
            .client
            .json(ModelCall::json(&prompt).system(SYSTEM_PROMPT).temperature(0.3))
            .await?;
        let object = value.as_object().ok_or_else(|| {
            DegradeReason::MalformedUpstreamResponse("memory extraction is not a JSON object".into())
        })?;

        Ok(object
            .iter()
            .filter_map(|(key, value)| scalar_text(value).map(|v| (key.clone(), v)))
            .filter(|(key, value)| !key.trim().is_empty() && !value.trim().is_empty())
            .collect())
    }
}

/// Strings, numbers and booleans as text; anything nested is dropped.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn fact_prompt(turn: &TurnMemory<'_>) -> String {
    let catalog = MemoryCategory::ALL
        .iter()
        .map(|c| format!("- {}: {}", c.key(), c.description()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Conversation:\nUser: {}\nAssistant: {}\n\n\
         Extract information that should be remembered for future interactions.\n\
         Prefer these keys when they fit:\n{catalog}\n\n\
         Respond in JSON format with key-value pairs.",
        turn.user_message, turn.response
    )
}
