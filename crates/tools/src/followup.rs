//! Follow-up tool: drafts a follow-up email from meeting and client details.

use async_trait::async_trait;
use meetwise_context::text::truncate_chars;
use meetwise_context::{GenerationRequest, OutputContract, SegmentKind};
use meetwise_core::error::{ModelError, ToolError};
use meetwise_core::tool::ToolKind;
use meetwise_providers::ModelClient;
use crate::artifact::{Artifact, FollowUpArtifact};
use crate::{GenerationTool, ToolInput, generation_failed};

const SYSTEM_PROMPT: &str = "You are an assistant that writes professional follow-up emails after client meetings. \
Match the tone of any past emails provided. Start with a line of the form 'Subject: ...'.";

const DEFAULT_SUBJECT: &str = "Follow-up: Meeting Discussion";
const MAX_TONE_SAMPLES: usize = 2;
const TONE_SAMPLE_CHARS: usize = 200;

pub struct FollowUpTool {
    client: ModelClient,
}

impl FollowUpTool {
    pub fn new(client: ModelClient) -> Self {
        Self { client }
    }
}

/// Everything known about the meeting and client, one fact per line.
fn gather_context(input: &ToolInput) -> String {
    let meeting = &input.meeting;
    let mut parts = Vec::new();

    if let Some(title) = &meeting.title {
        parts.push(format!("Meeting: {title}"));
    }
    if let Some(date) = &meeting.date {
        parts.push(format!("Date: {date}"));
    }
    if let Some(summary) = meeting.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        parts.push(format!("\nMeeting Summary:\n{summary}"));
    }
    if let Some(client) = &meeting.client_name {
        parts.push(format!("\nClient: {client}"));
    }
    if let Some(email) = &meeting.client_email {
        parts.push(format!("Email: {email}"));
    }

    let samples: Vec<&String> = meeting
        .tone_samples
        .iter()
        .filter(|s| !s.trim().is_empty())
        .take(MAX_TONE_SAMPLES)
        .collect();
    if !samples.is_empty() {
        parts.push("\nPast Email Tone Samples:".to_string());
        for (i, sample) in samples.iter().enumerate() {
            let (text, _) = truncate_chars(sample, TONE_SAMPLE_CHARS);
            parts.push(format!("\nSample {}:\n{text}", i + 1));
        }
    }

    if let Some(extra) = input.additional_context.as_deref().filter(|c| !c.trim().is_empty()) {
        parts.push(format!("\nAdditional Context:\n{extra}"));
    }

    parts.join("\n")
}

/// Split a drafted email into subject and body.
fn split_subject(email: &str) -> FollowUpArtifact {
    let Some((_, after)) = email.split_once("Subject:") else {
        return FollowUpArtifact {
            subject: DEFAULT_SUBJECT.to_string(),
            body: email.trim().to_string(),
        };
    };

    let (subject_line, body) = after.split_once('\n').unwrap_or((after, ""));
    let subject = subject_line.trim();
    FollowUpArtifact {
        subject: if subject.is_empty() {
            DEFAULT_SUBJECT.to_string()
        } else {
            subject.to_string()
        },
        body: body.trim().to_string(),
    }
}

#[async_trait]
impl GenerationTool for FollowUpTool {
    fn kind(&self) -> ToolKind {
        ToolKind::FollowUp
    }

    fn contract(&self) -> OutputContract {
        OutputContract::Freeform
    }

    fn build_request(&self, input: &ToolInput) -> Result<GenerationRequest, ToolError> {
        let context = gather_context(input);
        if context.trim().is_empty() {
            return Err(ToolError::InsufficientContext(self.kind().to_string()));
        }

        Ok(GenerationRequest::new(OutputContract::Freeform)
            .with_system(SYSTEM_PROMPT)
            .with_temperature(0.8)
            .segment(SegmentKind::MeetingInformation, format!("Context:\n{context}"))
            .segment(
                SegmentKind::TaskInstruction,
                "Generate a professional follow-up email based on the above information.",
            ))
    }

    async fn generate(&self, request: GenerationRequest, _input: &ToolInput) -> Result<Artifact, ToolError> {
        let prompt = request.prompt();
        let email = self
            .client
            .text(request.call(&prompt))
            .await
            .map_err(|e| generation_failed(self.kind(), e))?;
        if email.trim().is_empty() {
            return Err(generation_failed(
                self.kind(),
                ModelError::MalformedResponse("empty email".into()),
            ));
        }
        Ok(Artifact::FollowUp(split_subject(&email)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meetwise_core::integration::MeetingData;
    use meetwise_providers::ScriptedProvider;
    use std::sync::Arc;

    fn tool(provider: ScriptedProvider) -> FollowUpTool {
        FollowUpTool::new(ModelClient::new(Arc::new(provider), "test"))
    }

    #[test]
    fn no_context_is_insufficient() {
        let err = tool(ScriptedProvider::new())
            .build_request(&ToolInput {
                user_message: "write a follow-up".into(),
                additional_context: Some("   ".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ToolError::InsufficientContext(_)));
    }

    #[test]
    fn context_keeps_two_capped_tone_samples() {
        let input = ToolInput {
            meeting: MeetingData {
                title: Some("Acme sync".into()),
                client_name: Some("Acme".into()),
                client_email: Some("dana@acme.test".into()),
                tone_samples: vec!["a".repeat(500), "Thanks!".into(), "third".into()],
                ..Default::default()
            },
            ..Default::default()
        };
        let context = gather_context(&input);
        assert!(context.starts_with("Meeting: Acme sync"));
        assert!(context.contains("\nClient: Acme\nEmail: dana@acme.test"));
        assert!(context.contains(&format!("Sample 1:\n{}...", "a".repeat(197))));
        assert!(context.contains("Sample 2:\nThanks!"));
        assert!(!context.contains("third"));
    }

    #[test]
    fn subject_parsing() {
        let email = split_subject("Subject: Next steps on renewal\nHi Dana,\n\nThanks for today.");
        assert_eq!(email.subject, "Next steps on renewal");
        assert_eq!(email.body, "Hi Dana,\n\nThanks for today.");

        let bare = split_subject("Hi Dana,\nThanks.");
        assert_eq!(bare.subject, DEFAULT_SUBJECT);
        assert_eq!(bare.body, "Hi Dana,\nThanks.");

        let blank = split_subject("Subject:\nHello");
        assert_eq!(blank.subject, DEFAULT_SUBJECT);
        assert_eq!(blank.body, "Hello");
    }

    #[tokio::test]
    async fn generates_email() {
        let t = tool(ScriptedProvider::new().on(
            "Generate a professional follow-up email",
            "Subject: Thanks for the sync\n\nHi Dana,\nGreat talking today.",
        ));
        let input = ToolInput {
            additional_context: Some("Mention the pricing sheet".into()),
            ..Default::default()
        };
        let artifact = t.generate(t.build_request(&input).unwrap(), &input).await.unwrap();
        assert_eq!(
            artifact,
            Artifact::FollowUp(FollowUpArtifact {
                subject: "Thanks for the sync".into(),
                body: "Hi Dana,\nGreat talking today.".into(),
            })
        );
    }
}
