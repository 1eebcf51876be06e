//! Generation tools for meetwise.
//!
//! Each tool turns meeting data into one artifact: a structured summary, a
//! preparation brief, a follow-up email or a plain conversational answer.
//! Tools build a [`GenerationRequest`] and leave context placement to the
//! injection coordinator; the caller injects context between
//! [`GenerationTool::build_request`] and [`GenerationTool::generate`].

pub mod artifact;
pub mod brief;
pub mod followup;
pub mod general;
pub mod summarization;

use async_trait::async_trait;
use meetwise_context::{GenerationRequest, OutputContract};
use meetwise_core::error::ToolError;
use meetwise_core::integration::MeetingData;
use meetwise_core::tool::ToolKind;
use meetwise_providers::ModelClient;
use std::collections::HashMap;

pub use artifact::{Artifact, BriefArtifact, Decision, FollowUpArtifact, SummaryArtifact};
pub use brief::MeetingBriefTool;
pub use followup::FollowUpTool;
pub use general::GeneralTool;
pub use summarization::SummarizationTool;

/// What a tool works from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolInput {
    pub meeting: MeetingData,
    pub user_message: String,
    /// Free text the user supplied alongside the request
    pub additional_context: Option<String>,
}

/// A content-generation tool.
#[async_trait]
pub trait GenerationTool: Send + Sync {
    fn kind(&self) -> ToolKind;

    /// The output shape this tool's downstream rendering depends on.
    fn contract(&self) -> OutputContract;

    /// Build the primary generation request, without any context.
    fn build_request(&self, input: &ToolInput) -> Result<GenerationRequest, ToolError>;

    /// Send `request` (possibly with context injected) and parse the artifact.
    async fn generate(&self, request: GenerationRequest, input: &ToolInput) -> Result<Artifact, ToolError>;
}

/// The tools available to the pipeline, keyed by kind.
pub struct ToolSet {
    tools: HashMap<ToolKind, Box<dyn GenerationTool>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// All four tools over one model client.
    pub fn standard(client: ModelClient) -> Self {
        let mut set = Self::new();
        set.register(Box::new(SummarizationTool::new(client.clone())));
        set.register(Box::new(MeetingBriefTool::new(client.clone())));
        set.register(Box::new(FollowUpTool::new(client.clone())));
        set.register(Box::new(GeneralTool::new(client)));
        set
    }

    /// Register a tool. Replaces any existing tool of the same kind.
    pub fn register(&mut self, tool: Box<dyn GenerationTool>) {
        self.tools.insert(tool.kind(), tool);
    }

    pub fn get(&self, kind: ToolKind) -> Result<&dyn GenerationTool, ToolError> {
        self.tools
            .get(&kind)
            .map(|t| t.as_ref())
            .ok_or_else(|| ToolError::NotFound(kind.to_string()))
    }

    pub fn kinds(&self) -> Vec<ToolKind> {
        let mut kinds: Vec<ToolKind> = self.tools.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn generation_failed(kind: ToolKind, source: meetwise_core::error::ModelError) -> ToolError {
    ToolError::GenerationFailed {
        tool_name: kind.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meetwise_providers::ScriptedProvider;
    use std::sync::Arc;

    #[test]
    fn standard_set_has_every_kind() {
        let client = ModelClient::new(Arc::new(ScriptedProvider::new()), "test");
        let set = ToolSet::standard(client);
        assert_eq!(set.kinds().len(), ToolKind::ALL.len());
        for kind in ToolKind::ALL {
            assert_eq!(set.get(kind).unwrap().kind(), kind);
        }
    }

    #[test]
    fn contracts_per_tool() {
        let client = ModelClient::new(Arc::new(ScriptedProvider::new()), "test");
        let set = ToolSet::standard(client);
        assert_eq!(
            set.get(ToolKind::Summarization).unwrap().contract(),
            OutputContract::StructuredMarkdown
        );
        assert_eq!(
            set.get(ToolKind::MeetingBrief).unwrap().contract(),
            OutputContract::StructuredJson
        );
        assert_eq!(set.get(ToolKind::FollowUp).unwrap().contract(), OutputContract::Freeform);
        assert_eq!(set.get(ToolKind::General).unwrap().contract(), OutputContract::Freeform);
    }

    #[test]
    fn missing_tool_is_not_found() {
        let set = ToolSet::new();
        assert!(matches!(set.get(ToolKind::FollowUp), Err(ToolError::NotFound(_))));
    }
}
