//! Summarization tool: post-meeting structured summary plus decisions.

use async_trait::async_trait;
use meetwise_context::{GenerationRequest, OutputContract, SegmentKind};
use meetwise_core::error::ToolError;
use meetwise_core::tool::ToolKind;
use meetwise_providers::ModelClient;
use tracing::{debug, warn};
use crate::artifact::{Artifact, Decision, SummaryArtifact};
use crate::{GenerationTool, ToolInput, generation_failed};

const SYSTEM_PROMPT: &str = "You are a meeting summarization expert. Analyze meeting transcripts and \
create comprehensive, well-structured summaries with clear sections for overview, action items, outline, and conclusions.
Categorize action items by who is responsible (client vs user).";

const DEFAULT_TITLE: &str = "Untitled Meeting";
const DEFAULT_DATE: &str = "Unknown date";
const DEFAULT_RECORDING_DATE: &str = "N/A";
const DEFAULT_ATTENDEES: &str = "Not specified";

/// Display values with defaults filled in.
struct Header {
    title: String,
    date: String,
    recording_date: String,
    attendees: String,
}

impl Header {
    fn from_input(input: &ToolInput) -> Self {
        let meeting = &input.meeting;
        Self {
            title: meeting.title.clone().unwrap_or_else(|| DEFAULT_TITLE.into()),
            date: meeting.date.clone().unwrap_or_else(|| DEFAULT_DATE.into()),
            recording_date: meeting
                .recording_date
                .clone()
                .unwrap_or_else(|| DEFAULT_RECORDING_DATE.into()),
            attendees: meeting
                .attendees_display()
                .unwrap_or_else(|| DEFAULT_ATTENDEES.into()),
        }
    }
}

pub struct SummarizationTool {
    client: ModelClient,
}

impl SummarizationTool {
    pub fn new(client: ModelClient) -> Self {
        Self { client }
    }

    /// The follow-up request that pulls decisions out of a generated summary.
    ///
    /// It works over already-generated content, so it never takes context.
    pub fn decision_request(summary: &str) -> GenerationRequest {
        GenerationRequest::new(OutputContract::StructuredJson)
            .with_temperature(0.2)
            .segment(
                SegmentKind::DerivativeExtraction,
                "Based on the following meeting summary, extract:\n1. All decisions made (who decided what)",
            )
            .segment(SegmentKind::SourceMaterial, format!("Meeting Summary:\n{summary}"))
            .segment(
                SegmentKind::SchemaDeclaration,
                "Respond in JSON format:\n{\n    \"decisions\": [\n        {\"description\": \"...\", \"context\": \"...\"}\n    ]\n}",
            )
    }

    async fn extract_decisions(&self, summary: &str) -> Vec<Decision> {
        let request = Self::decision_request(summary);
        let prompt = request.prompt();
        match self.client.json(request.call(&prompt)).await {
            Ok(value) => parse_decisions(&value),
            Err(e) => {
                warn!(error = %e, "Decision extraction failed, continuing without decisions");
                Vec::new()
            }
        }
    }
}

fn parse_decisions(value: &serde_json::Value) -> Vec<Decision> {
    let Some(items) = value.get("decisions").and_then(|d| d.as_array()) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            serde_json::Value::String(s) => Some(Decision {
                description: s.trim().to_string(),
                context: String::new(),
            }),
            other => serde_json::from_value::<Decision>(other.clone()).ok(),
        })
        .filter(|d| !d.description.trim().is_empty())
        .collect()
}

#[async_trait]
impl GenerationTool for SummarizationTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Summarization
    }

    fn contract(&self) -> OutputContract {
        OutputContract::StructuredMarkdown
    }

    fn build_request(&self, input: &ToolInput) -> Result<GenerationRequest, ToolError> {
        let h = Header::from_input(input);
        let request = GenerationRequest::new(OutputContract::StructuredMarkdown)
            .with_system(SYSTEM_PROMPT)
            .with_temperature(0.3);

        let request = match input.meeting.transcript.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(transcript) => request
                .segment(
                    SegmentKind::TaskInstruction,
                    "Analyze the following meeting transcript and create a comprehensive, well-structured summary.",
                )
                .segment(
                    SegmentKind::MeetingInformation,
                    format!(
                        "Meeting Information:\n- Title: {}\n- Calendar Event Date: {}\n- Zoom Recording Date: {}\n- Attendees: {}",
                        h.title, h.date, h.recording_date, h.attendees
                    ),
                )
                .segment(SegmentKind::SourceMaterial, format!("Meeting Transcript:\n{transcript}"))
                .segment(SegmentKind::FormatInstruction, transcript_format(&h)),
            None => request
                .segment(
                    SegmentKind::TaskInstruction,
                    "Create a meeting summary based on the available calendar information. \
                     Note that no Zoom recording is available for this meeting.",
                )
                .segment(
                    SegmentKind::MeetingInformation,
                    format!(
                        "Meeting Information:\n- Title: {}\n- Calendar Event Date: {}\n- Attendees: {}",
                        h.title, h.date, h.attendees
                    ),
                )
                .segment(SegmentKind::FormatInstruction, calendar_only_format(&h)),
        };
        Ok(request)
    }

    async fn generate(&self, request: GenerationRequest, input: &ToolInput) -> Result<Artifact, ToolError> {
        let prompt = request.prompt();
        let text = self
            .client
            .text(request.call(&prompt))
            .await
            .map_err(|e| generation_failed(self.kind(), e))?;
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(generation_failed(
                self.kind(),
                meetwise_core::error::ModelError::MalformedResponse("empty summary".into()),
            ));
        }

        let has_transcript = input.meeting.has_transcript();
        let decisions = if has_transcript {
            self.extract_decisions(&text).await
        } else {
            Vec::new()
        };
        debug!(chars = text.chars().count(), decisions = decisions.len(), "Summary generated");

        let h = Header::from_input(input);
        Ok(Artifact::Summary(SummaryArtifact {
            text,
            title: h.title,
            date: h.date,
            recording_date: h.recording_date,
            attendees: h.attendees,
            decisions,
            has_transcript,
        }))
    }
}

fn transcript_format(h: &Header) -> String {
    format!(
        r#"Please create a summary with the following EXACT structure and formatting:

# Meeting Header
{title}

## Date from calendar:
{date}

## Participants:
{attendees}

## Overview:
[Provide a brief 2-3 sentence summary of what the meeting was about, who attended, and the main purpose. Focus on the key objectives and outcomes.]

## Outline:
[Provide 2-3 sentences summarizing the major sections or topics discussed in the meeting. Write in complete sentences (not bullet points) that outline what was covered in each main section. Keep it succinct and focused on the key discussion areas.]

## Conclusion:
[Provide a summary of decisions made, next steps, and any important takeaways. Include any commitments, agreements, or follow-up requirements.]

Format your response using the EXACT section headers shown above (with # and ## markdown formatting). Be clear, concise, and well-organized."#,
        title = h.title,
        date = h.date,
        attendees = h.attendees,
    )
}

fn calendar_only_format(h: &Header) -> String {
    format!(
        r#"IMPORTANT: There is no Zoom recording or transcript available for this meeting. Please create a summary with the following EXACT structure and formatting:

# Meeting Header
{title}

## Date from calendar:
{date}

## Participants:
{attendees}

## Overview:
[Provide a brief 2-3 sentence summary based on the meeting title and attendees. Since no transcript is available, focus on what can be inferred from the meeting title and who was scheduled to attend.]

## Recording Status:
No Zoom recording is available for this meeting. This summary is based solely on the calendar event information (title, date, and participants).

## Outline:
[Since no transcript is available, you cannot provide details about what was discussed. Instead, write: "No transcript available - unable to provide meeting outline."]

## Conclusion:
[Since no transcript is available, you cannot provide details about decisions or next steps. Instead, write: "No transcript available - unable to provide meeting conclusions."]

Format your response using the EXACT section headers shown above (with # and ## markdown formatting). Be clear, concise, and well-organized."#,
        title = h.title,
        date = h.date,
        attendees = h.attendees,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use meetwise_context::{ContextSection, Placement, SectionOrigin, SkipReason, decide, inject};
    use meetwise_core::error::ProviderError;
    use meetwise_core::integration::MeetingData;
    use meetwise_providers::ScriptedProvider;
    use serde_json::json;
    use std::sync::Arc;

    fn tool(provider: Arc<ScriptedProvider>) -> SummarizationTool {
        SummarizationTool::new(ModelClient::new(provider, "test"))
    }

    fn with_transcript() -> ToolInput {
        ToolInput {
            meeting: MeetingData {
                title: Some("Acme QBR".into()),
                date: Some("2025-03-04".into()),
                attendees: vec!["Dana".into(), "Lee".into()],
                transcript: Some("Dana: we agreed to ship v2 in May.".into()),
                ..Default::default()
            },
            user_message: "summarize my last Acme meeting".into(),
            additional_context: None,
        }
    }

    fn insights_section() -> ContextSection {
        ContextSection {
            content: "User Context / Memory:\n- Preferences: bullet points".into(),
            origin: SectionOrigin::Insights,
            hard_cap: 1200,
            truncated: false,
        }
    }

    #[test]
    fn transcript_request_has_exact_headers() {
        let provider = Arc::new(ScriptedProvider::new());
        let request = tool(provider).build_request(&with_transcript()).unwrap();
        let prompt = request.prompt();
        for header in [
            "# Meeting Header\nAcme QBR",
            "## Date from calendar:\n2025-03-04",
            "## Participants:\nDana, Lee",
            "## Overview:",
            "## Outline:",
            "## Conclusion:",
        ] {
            assert!(prompt.contains(header), "missing {header}");
        }
        assert!(prompt.contains("- Zoom Recording Date: N/A"));
        assert!(!prompt.contains("## Recording Status:"));
        assert!((request.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn calendar_only_request_uses_defaults() {
        let provider = Arc::new(ScriptedProvider::new());
        let input = ToolInput::default();
        let prompt = tool(provider).build_request(&input).unwrap().prompt();
        assert!(prompt.contains("# Meeting Header\nUntitled Meeting"));
        assert!(prompt.contains("## Date from calendar:\nUnknown date"));
        assert!(prompt.contains("## Participants:\nNot specified"));
        assert!(prompt.contains("## Recording Status:"));
    }

    #[test]
    fn context_lands_after_task_before_meeting_information() {
        let provider = Arc::new(ScriptedProvider::new());
        let request = tool(provider).build_request(&with_transcript()).unwrap();
        let (injected, placements) = inject(request, &[&insights_section()]);
        assert_eq!(placements, vec![Placement::Insert(1)]);
        assert_eq!(injected.segments[0].kind, SegmentKind::TaskInstruction);
        assert_eq!(injected.segments[1].kind, SegmentKind::Context);
        assert_eq!(injected.segments[2].kind, SegmentKind::MeetingInformation);
    }

    #[test]
    fn decision_request_refuses_context() {
        let request = SummarizationTool::decision_request("# Meeting Header");
        assert_eq!(
            decide(&request, &insights_section()),
            Placement::Skip(SkipReason::DerivativeRequest)
        );
    }

    #[tokio::test]
    async fn generates_summary_with_decisions() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .on("Analyze the following meeting transcript", "# Meeting Header\nAcme QBR\n## Conclusion:\nShip v2.")
                .on_json(
                    "extract:\n1. All decisions made",
                    json!({"decisions": [{"description": "Ship v2 in May", "context": "roadmap"}, {"context": "no description"}]}),
                ),
        );
        let t = tool(provider.clone());
        let input = with_transcript();
        let request = t.build_request(&input).unwrap();
        let artifact = t.generate(request, &input).await.unwrap();

        let Artifact::Summary(summary) = artifact else {
            panic!("expected a summary");
        };
        assert_eq!(summary.title, "Acme QBR");
        assert_eq!(summary.attendees, "Dana, Lee");
        assert!(summary.has_transcript);
        assert_eq!(
            summary.decisions,
            vec![Decision {
                description: "Ship v2 in May".into(),
                context: "roadmap".into()
            }]
        );
        let extraction = &provider.requests()[1];
        assert!((extraction.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn failed_decision_extraction_keeps_summary() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .on("Analyze the following meeting transcript", "# Meeting Header")
                .fail_on("All decisions made", ProviderError::Network("reset".into())),
        );
        let t = tool(provider);
        let input = with_transcript();
        let artifact = t.generate(t.build_request(&input).unwrap(), &input).await.unwrap();
        let Artifact::Summary(summary) = artifact else {
            panic!("expected a summary");
        };
        assert!(summary.decisions.is_empty());
    }

    #[tokio::test]
    async fn no_transcript_skips_decision_extraction() {
        let provider = Arc::new(ScriptedProvider::new().otherwise("# Meeting Header\nUntitled Meeting"));
        let t = tool(provider.clone());
        let input = ToolInput::default();
        t.generate(t.build_request(&input).unwrap(), &input).await.unwrap();
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn primary_failure_is_generation_failed() {
        let provider = Arc::new(
            ScriptedProvider::new().fail_on("meeting", ProviderError::AuthenticationFailed("bad key".into())),
        );
        let t = tool(provider);
        let input = with_transcript();
        let err = t.generate(t.build_request(&input).unwrap(), &input).await.unwrap_err();
        assert!(matches!(err, ToolError::GenerationFailed { .. }));
    }
}
