//! Generation tool identifiers.
//!
//! The same identifier names a user intent, the tool that serves it, and
//! the `tool_used` tag written into memory records.

use serde::{Deserialize, Serialize};

/// The generation tools a turn can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Post-meeting summary
    Summarization,
    /// Pre-meeting preparation brief
    MeetingBrief,
    /// Follow-up email draft
    #[serde(rename = "followup")]
    FollowUp,
    /// Plain conversation, no meeting tool
    General,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Summarization,
        ToolKind::MeetingBrief,
        ToolKind::FollowUp,
        ToolKind::General,
    ];

    /// The identifier stored in `extra_data.tool_used`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::Summarization => "summarization",
            ToolKind::MeetingBrief => "meeting_brief",
            ToolKind::FollowUp => "followup",
            ToolKind::General => "general",
        }
    }

    /// Parse an identifier; unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summarization" => Some(ToolKind::Summarization),
            "meeting_brief" => Some(ToolKind::MeetingBrief),
            "followup" | "follow_up" => Some(ToolKind::FollowUp),
            "general" => Some(ToolKind::General),
            _ => None,
        }
    }

    /// Whether this kind needs meeting data from the integrations.
    pub fn needs_meeting_data(&self) -> bool {
        !matches!(self, ToolKind::General)
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
