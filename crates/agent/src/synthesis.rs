//! Output synthesis: turns an artifact into the user-facing response.

use meetwise_context::ContextSection;
use meetwise_tools::{Artifact, SummaryArtifact};

/// Format `artifact` for the user, appending `annotation` when it has content.
pub fn render_response(artifact: &Artifact, annotation: Option<&ContextSection>) -> String {
    let body = match artifact {
        Artifact::Summary(summary) => render_summary(summary),
        Artifact::Brief(brief) => brief.render(),
        Artifact::FollowUp(email) => format!("Subject: {}\n\n{}", email.subject, email.body),
        Artifact::General { text } => text.clone(),
    };

    match annotation.filter(|a| !a.is_empty()) {
        Some(section) => format!("{body}\n\n{}", section.content),
        None => body,
    }
}

fn render_summary(summary: &SummaryArtifact) -> String {
    let mut parts = vec![
        "## Summary\n".to_string(),
        format!("**Meeting Title:** {}\n", summary.title),
        format!("**Calendar Event Date:** {}\n", summary.date),
    ];
    if summary.has_transcript {
        parts.push(format!("**Zoom Recording Date:** {}\n", summary.recording_date));
    }
    parts.push(format!("**Attendees:** {}\n\n", summary.attendees));
    parts.push(summary.text.clone());

    if !summary.decisions.is_empty() {
        parts.push("\n\nDecisions Made:".to_string());
        parts.extend(summary.decisions.iter().map(|d| format!("- {}", d.description)));
    }
    parts.join("\n")
}
