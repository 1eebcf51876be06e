//! Meeting brief tool: pre-meeting preparation as structured JSON.

use async_trait::async_trait;
use meetwise_context::{GenerationRequest, OutputContract, SegmentKind};
use meetwise_core::error::{ModelError, ToolError};
use meetwise_core::tool::ToolKind;
use meetwise_providers::ModelClient;
use serde_json::Value;
use crate::artifact::{Artifact, BriefArtifact};
use crate::{GenerationTool, ToolInput, generation_failed};

const SYSTEM_PROMPT: &str = "You are a meeting preparation assistant. Build concise, practical briefs \
that help the user walk into a meeting knowing what matters.";

const SCHEMA: &str = r#"{
    "key_topics": ["topic 1", "topic 2"],
    "client_context": "Important context about the client",
    "questions": ["question 1", "question 2"],
    "goals": ["goal 1", "goal 2"],
    "background": "Any relevant background information"
}"#;

pub struct MeetingBriefTool {
    client: ModelClient,
}

impl MeetingBriefTool {
    pub fn new(client: ModelClient) -> Self {
        Self { client }
    }
}

fn meeting_information(input: &ToolInput) -> String {
    let meeting = &input.meeting;
    let mut parts = Vec::new();
    if let Some(client) = &meeting.client_name {
        parts.push(format!("Client: {client}"));
    }
    if let Some(title) = &meeting.title {
        parts.push(format!("Meeting Title: {title}"));
    }
    if let Some(date) = &meeting.date {
        parts.push(format!("Meeting Date: {date}"));
    }
    if let Some(attendees) = meeting.attendees_display() {
        parts.push(format!("Attendees: {attendees}"));
    }
    if let Some(context) = input.additional_context.as_deref().filter(|c| !c.trim().is_empty()) {
        parts.push(format!("\nClient Context:\n{context}"));
    }
    if let Some(summary) = meeting.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        parts.push(format!("\nPrevious Meeting Summary:\n{summary}"));
    }

    if parts.is_empty() {
        "Meeting Information:\nNo specific meeting information provided.".to_string()
    } else {
        format!("Meeting Information:\n{}", parts.join("\n"))
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value.get(key).and_then(Value::as_str).map(str::trim).unwrap_or_default().to_string()
}

/// A list field; a bare string counts as a one-item list.
fn list_field(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn parse_brief(value: &Value) -> Result<BriefArtifact, ModelError> {
    if !value.is_object() {
        return Err(ModelError::MalformedResponse("brief is not a JSON object".into()));
    }
    let brief = BriefArtifact {
        key_topics: list_field(value, "key_topics"),
        client_context: string_field(value, "client_context"),
        questions: list_field(value, "questions"),
        goals: list_field(value, "goals"),
        background: string_field(value, "background"),
    };
    if brief.is_empty() {
        return Err(ModelError::MalformedResponse("brief has no content".into()));
    }
    Ok(brief)
}

#[async_trait]
impl GenerationTool for MeetingBriefTool {
    fn kind(&self) -> ToolKind {
        ToolKind::MeetingBrief
    }

    fn contract(&self) -> OutputContract {
        OutputContract::StructuredJson
    }

    fn build_request(&self, input: &ToolInput) -> Result<GenerationRequest, ToolError> {
        Ok(GenerationRequest::new(OutputContract::StructuredJson)
            .with_system(SYSTEM_PROMPT)
            .with_temperature(0.7)
            .segment(
                SegmentKind::TaskInstruction,
                "Generate a comprehensive meeting brief to help prepare for an upcoming meeting.",
            )
            .segment(SegmentKind::MeetingInformation, meeting_information(input))
            .segment(
                SegmentKind::JsonShapeInstruction,
                "Please create a meeting brief that includes:\n\
                 1. Key topics to discuss\n\
                 2. Important context about the client\n\
                 3. Questions to ask\n\
                 4. Goals and objectives\n\
                 5. Any relevant background information\n\n\
                 Respond with a single JSON object using exactly these keys:",
            )
            .segment(SegmentKind::SchemaDeclaration, SCHEMA))
    }

    async fn generate(&self, request: GenerationRequest, _input: &ToolInput) -> Result<Artifact, ToolError> {
        let prompt = request.prompt();
        let value = self
            .client
            .json(request.call(&prompt))
            .await
            .map_err(|e| generation_failed(self.kind(), e))?;
        let brief = parse_brief(&value).map_err(|e| generation_failed(self.kind(), e))?;
        Ok(Artifact::Brief(brief))
    }
}
