//! General responder: answers messages that need no meeting tool.

use async_trait::async_trait;
use meetwise_context::{GenerationRequest, OutputContract, SegmentKind};
use meetwise_core::error::{ModelError, ToolError};
use meetwise_core::tool::ToolKind;
use meetwise_providers::ModelClient;
use crate::artifact::Artifact;
use crate::{GenerationTool, ToolInput, generation_failed};

const SYSTEM_PROMPT: &str = "You are a helpful meeting assistant. Synthesize responses from tool outputs \
into natural, conversational language. Be concise but informative.";

pub struct GeneralTool {
    client: ModelClient,
}

impl GeneralTool {
    pub fn new(client: ModelClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GenerationTool for GeneralTool {
    fn kind(&self) -> ToolKind {
        ToolKind::General
    }

    fn contract(&self) -> OutputContract {
        OutputContract::Freeform
    }

    fn build_request(&self, input: &ToolInput) -> Result<GenerationRequest, ToolError> {
        if input.user_message.trim().is_empty() {
            return Err(ToolError::InvalidInput("empty message".into()));
        }
        Ok(GenerationRequest::new(OutputContract::Freeform)
            .with_system(SYSTEM_PROMPT)
            .with_temperature(0.7)
            .segment(SegmentKind::SourceMaterial, format!("User message: {}", input.user_message))
            .segment(
                SegmentKind::TaskInstruction,
                "Provide a helpful response. If the user is asking about meetings, briefs, summaries, or follow-ups, \
                 guide them on how to use the assistant.",
            ))
    }

    async fn generate(&self, request: GenerationRequest, _input: &ToolInput) -> Result<Artifact, ToolError> {
        let prompt = request.prompt();
        let text = self
            .client
            .text(request.call(&prompt))
            .await
            .map_err(|e| generation_failed(self.kind(), e))?;
        let text = text.trim();
        if text.is_empty() {
            return Err(generation_failed(
                self.kind(),
                ModelError::MalformedResponse("empty response".into()),
            ));
        }
        Ok(Artifact::General { text: text.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meetwise_context::{ContextSection, Placement, SectionOrigin, inject};
    use meetwise_providers::ScriptedProvider;
    use std::sync::Arc;

    #[tokio::test]
    async fn answers_with_context_appended() {
        let provider = Arc::new(ScriptedProvider::new().otherwise("  I can summarize meetings for you.  "));
        let tool = GeneralTool::new(ModelClient::new(provider.clone(), "test"));
        let input = ToolInput {
            user_message: "what can you do?".into(),
            ..Default::default()
        };
        let section = ContextSection {
            content: "User Context / Memory:\n- Preferences: brief answers".into(),
            origin: SectionOrigin::Insights,
            hard_cap: 1200,
            truncated: false,
        };
        let (request, placements) = inject(tool.build_request(&input).unwrap(), &[&section]);
        assert_eq!(placements, vec![Placement::Insert(2)]);

        let artifact = tool.generate(request, &input).await.unwrap();
        assert_eq!(
            artifact,
            Artifact::General {
                text: "I can summarize meetings for you.".into()
            }
        );
        let sent = &provider.requests()[0];
        assert!(sent.messages[1].content.ends_with("- Preferences: brief answers"));
    }

    #[test]
    fn blank_message_rejected() {
        let tool = GeneralTool::new(ModelClient::new(Arc::new(ScriptedProvider::new()), "test"));
        assert!(matches!(
            tool.build_request(&ToolInput::default()),
            Err(ToolError::InvalidInput(_))
        ));
    }
}
