//! Context Section Builder: renders insights or deltas into one bounded block.

use serde::Serialize;
use tracing::debug;
use crate::delta::{DeltaCategory, DeltaReport};
use crate::insights::SynthesizedInsights;
use crate::text::truncate_chars;

pub const INSIGHTS_HEADER: &str = "User Context / Memory:";
pub const DELTA_HEADER: &str = "Changes Since Previous Meeting:";

/// Where a section's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionOrigin {
    Insights,
    Delta,
}

impl std::fmt::Display for SectionOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionOrigin::Insights => write!(f, "insights"),
            SectionOrigin::Delta => write!(f, "delta"),
        }
    }
}

/// A rendered, capped block of advisory context.
///
/// `content` never exceeds `hard_cap` characters. An empty `content` means
/// there was nothing worth saying and the section must not be injected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSection {
    pub content: String,
    pub origin: SectionOrigin,
    pub hard_cap: usize,
    /// Whether the rendered block was cut to fit `hard_cap`
    pub truncated: bool,
}

impl ContextSection {
    pub fn empty(origin: SectionOrigin, hard_cap: usize) -> Self {
        Self {
            content: String::new(),
            origin,
            hard_cap,
            truncated: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }
}

/// Render insights: header plus one bullet per non-empty field.
pub fn render_insights(insights: &SynthesizedInsights, hard_cap: usize) -> ContextSection {
    let lines: Vec<String> = insights
        .fields()
        .filter(|(_, value)| !value.is_empty())
        .map(|(field, value)| format!("- {}: {}", field.label(), value))
        .collect();

    build(SectionOrigin::Insights, INSIGHTS_HEADER, lines, hard_cap)
}

/// Render a delta: header plus one bullet per non-empty displayed category.
///
/// Repeated topics are never rendered.
pub fn render_delta(delta: &DeltaReport, hard_cap: usize) -> ContextSection {
    let lines: Vec<String> = DeltaCategory::RENDERED
        .iter()
        .filter_map(|category| {
            let items = delta.get(*category);
            (!items.is_empty()).then(|| format!("- {}: {}", category.label(), items.join(", ")))
        })
        .collect();

    build(SectionOrigin::Delta, DELTA_HEADER, lines, hard_cap)
}

fn build(origin: SectionOrigin, header: &str, lines: Vec<String>, hard_cap: usize) -> ContextSection {
    if lines.is_empty() {
        return ContextSection::empty(origin, hard_cap);
    }

    let block = std::iter::once(header.to_string())
        .chain(lines)
        .collect::<Vec<_>>()
        .join("\n");
    let (content, truncated) = truncate_chars(&block, hard_cap);
    if truncated {
        debug!(%origin, cap = hard_cap, "Context section truncated to cap");
    }

    ContextSection {
        content,
        origin,
        hard_cap,
        truncated,
    }
}
