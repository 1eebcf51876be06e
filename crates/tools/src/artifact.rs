//! What the generation tools produce.

use meetwise_core::tool::ToolKind;
use serde::{Deserialize, Serialize};

/// A decision pulled out of a meeting summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub description: String,
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryArtifact {
    /// The structured markdown summary
    pub text: String,
    pub title: String,
    pub date: String,
    pub recording_date: String,
    pub attendees: String,
    pub decisions: Vec<Decision>,
    pub has_transcript: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BriefArtifact {
    pub key_topics: Vec<String>,
    pub client_context: String,
    pub questions: Vec<String>,
    pub goals: Vec<String>,
    pub background: String,
}

impl BriefArtifact {
    pub fn is_empty(&self) -> bool {
        self.key_topics.is_empty()
            && self.client_context.is_empty()
            && self.questions.is_empty()
            && self.goals.is_empty()
            && self.background.is_empty()
    }

    /// Markdown rendering, skipping empty sections.
    pub fn render(&self) -> String {
        let mut sections = Vec::new();
        if !self.key_topics.is_empty() {
            sections.push(format!("## Key Topics\n{}", bullets(&self.key_topics)));
        }
        if !self.client_context.is_empty() {
            sections.push(format!("## Client Context\n{}", self.client_context));
        }
        if !self.questions.is_empty() {
            sections.push(format!("## Questions to Ask\n{}", bullets(&self.questions)));
        }
        if !self.goals.is_empty() {
            sections.push(format!("## Goals\n{}", bullets(&self.goals)));
        }
        if !self.background.is_empty() {
            sections.push(format!("## Background\n{}", self.background));
        }
        sections.join("\n\n")
    }
}

fn bullets(items: &[String]) -> String {
    items.iter().map(|i| format!("- {i}")).collect::<Vec<_>>().join("\n")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowUpArtifact {
    pub subject: String,
    pub body: String,
}

/// The result of one tool run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    Summary(SummaryArtifact),
    Brief(BriefArtifact),
    FollowUp(FollowUpArtifact),
    General { text: String },
}

impl Artifact {
    pub fn tool(&self) -> ToolKind {
        match self {
            Artifact::Summary(_) => ToolKind::Summarization,
            Artifact::Brief(_) => ToolKind::MeetingBrief,
            Artifact::FollowUp(_) => ToolKind::FollowUp,
            Artifact::General { .. } => ToolKind::General,
        }
    }

    /// The text stored as the interaction record's value.
    ///
    /// For summaries this is the summary itself, so later turns can compare
    /// against it.
    pub fn memory_value(&self) -> String {
        match self {
            Artifact::Summary(s) => s.text.clone(),
            Artifact::Brief(b) => b.render(),
            Artifact::FollowUp(f) => format!("Subject: {}\n\n{}", f.subject, f.body),
            Artifact::General { text } => text.clone(),
        }
    }

    pub fn summary_text(&self) -> Option<&str> {
        match self {
            Artifact::Summary(s) => Some(&s.text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brief_render_skips_empty_sections() {
        let brief = BriefArtifact {
            key_topics: vec!["Renewal".into(), "Pricing".into()],
            background: "Customer since 2021".into(),
            ..Default::default()
        };
        assert_eq!(
            brief.render(),
            "## Key Topics\n- Renewal\n- Pricing\n\n## Background\nCustomer since 2021"
        );
        assert!(BriefArtifact::default().is_empty());
    }

    #[test]
    fn memory_value_per_kind() {
        let followup = Artifact::FollowUp(FollowUpArtifact {
            subject: "Next steps".into(),
            body: "Hi Dana,".into(),
        });
        assert_eq!(followup.memory_value(), "Subject: Next steps\n\nHi Dana,");
        assert_eq!(followup.tool(), ToolKind::FollowUp);
        assert!(followup.summary_text().is_none());
    }
}
