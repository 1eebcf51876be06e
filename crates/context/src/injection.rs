//! Injection Coordinator: where a context section may go in a generation request.
//!
//! Structured sinks are parsed downstream by position or key, so context
//! text must never land inside their structural instructions. The placement
//! table in [`placement_rule`] is the only place these rules live; tools
//! build requests and call [`inject`], they never decide placement.

use meetwise_core::provider::ResponseShape;
use meetwise_providers::ModelCall;
use serde::Serialize;
use tracing::debug;
use crate::section::ContextSection;

/// The structural shape a consumer requires from generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputContract {
    /// Markdown with required headers
    StructuredMarkdown,
    /// Free text with no downstream parser
    Freeform,
    /// JSON with required keys
    StructuredJson,
}

impl OutputContract {
    pub const ALL: [OutputContract; 3] = [
        OutputContract::StructuredMarkdown,
        OutputContract::Freeform,
        OutputContract::StructuredJson,
    ];

    pub fn is_structured(&self) -> bool {
        !matches!(self, OutputContract::Freeform)
    }
}

/// What a prompt segment is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    TaskInstruction,
    MeetingInformation,
    SourceMaterial,
    FormatInstruction,
    /// Extraction over content an earlier stage already generated
    DerivativeExtraction,
    JsonShapeInstruction,
    SchemaDeclaration,
    /// Injected context section
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub text: String,
}

impl Segment {
    pub fn new(kind: SegmentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// A tool's request to the model, as an ordered list of typed segments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub contract: OutputContract,
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub shape: ResponseShape,
    pub segments: Vec<Segment>,
}

impl GenerationRequest {
    pub fn new(contract: OutputContract) -> Self {
        let shape = match contract {
            OutputContract::StructuredJson => ResponseShape::Json,
            _ => ResponseShape::Text,
        };
        Self {
            contract,
            system_prompt: None,
            temperature: 0.7,
            shape,
            segments: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn segment(mut self, kind: SegmentKind, text: impl Into<String>) -> Self {
        self.segments.push(Segment::new(kind, text));
        self
    }

    pub fn has(&self, kind: SegmentKind) -> bool {
        self.segments.iter().any(|s| s.kind == kind)
    }

    fn position(&self, kind: SegmentKind) -> Option<usize> {
        self.segments.iter().position(|s| s.kind == kind)
    }

    /// Segment texts joined by a blank line.
    pub fn prompt(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// A model call for this request, borrowing an already-rendered prompt.
    pub fn call<'a>(&'a self, prompt: &'a str) -> ModelCall<'a> {
        let mut call = match self.shape {
            ResponseShape::Json => ModelCall::json(prompt),
            ResponseShape::Text => ModelCall::text(prompt),
        }
        .temperature(self.temperature);
        if let Some(system) = self.system_prompt.as_deref() {
            call = call.system(system);
        }
        call
    }
}

/// Legal placement for one contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementRule {
    /// Insert immediately before the first segment of this kind
    pub anchor: Option<SegmentKind>,
    /// Segments that must all come before the insertion point
    pub preamble: &'static [SegmentKind],
    /// Segments context must never sit inside
    pub forbidden: &'static [SegmentKind],
}

/// The placement table.
pub fn placement_rule(contract: OutputContract) -> PlacementRule {
    match contract {
        OutputContract::StructuredMarkdown => PlacementRule {
            anchor: Some(SegmentKind::MeetingInformation),
            preamble: &[SegmentKind::TaskInstruction],
            forbidden: &[SegmentKind::FormatInstruction, SegmentKind::DerivativeExtraction],
        },
        OutputContract::Freeform => PlacementRule {
            anchor: None,
            preamble: &[],
            forbidden: &[],
        },
        OutputContract::StructuredJson => PlacementRule {
            anchor: Some(SegmentKind::MeetingInformation),
            preamble: &[],
            forbidden: &[SegmentKind::JsonShapeInstruction, SegmentKind::SchemaDeclaration],
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Nothing to inject
    EmptySection,
    /// Structured request over already-generated content
    DerivativeRequest,
    /// The request has no anchor segment
    NoAnchor,
    /// The anchor sits within structural instructions
    AnchorInsideStructuralSpan,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::EmptySection => "empty section",
            SkipReason::DerivativeRequest => "derivative request",
            SkipReason::NoAnchor => "no anchor segment",
            SkipReason::AnchorInsideStructuralSpan => "anchor inside structural span",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Insert as a new segment at this index
    Insert(usize),
    Skip(SkipReason),
}

/// Decide where `section` may go in `request`.
pub fn decide(request: &GenerationRequest, section: &ContextSection) -> Placement {
    if section.is_empty() {
        return Placement::Skip(SkipReason::EmptySection);
    }
    if request.contract.is_structured() && request.has(SegmentKind::DerivativeExtraction) {
        return Placement::Skip(SkipReason::DerivativeRequest);
    }

    let rule = placement_rule(request.contract);
    let Some(anchor) = rule.anchor else {
        // Freeform: ahead of the meeting details when there are any.
        let index = request
            .position(SegmentKind::MeetingInformation)
            .unwrap_or(request.segments.len());
        return Placement::Insert(index);
    };

    let Some(index) = request.position(anchor) else {
        return Placement::Skip(SkipReason::NoAnchor);
    };

    if inside_forbidden_span(request, rule.forbidden, index) || before_preamble(request, rule.preamble, index) {
        return Placement::Skip(SkipReason::AnchorInsideStructuralSpan);
    }
    Placement::Insert(index)
}

/// Whether inserting at `index` lands between the first and last forbidden segment.
fn inside_forbidden_span(request: &GenerationRequest, forbidden: &[SegmentKind], index: usize) -> bool {
    let mut positions = request
        .segments
        .iter()
        .enumerate()
        .filter(|(_, s)| forbidden.contains(&s.kind))
        .map(|(i, _)| i);
    let Some(first) = positions.next() else {
        return false;
    };
    let last = positions.last().unwrap_or(first);
    first < index && index <= last
}

fn before_preamble(request: &GenerationRequest, preamble: &[SegmentKind], index: usize) -> bool {
    request.segments[index..]
        .iter()
        .any(|s| preamble.contains(&s.kind))
}

/// Place each non-empty section, in order, and return the request with the
/// decision made for every section.
pub fn inject(mut request: GenerationRequest, sections: &[&ContextSection]) -> (GenerationRequest, Vec<Placement>) {
    let mut placements = Vec::with_capacity(sections.len());
    for section in sections {
        let placement = decide(&request, section);
        match placement {
            Placement::Insert(index) => {
                request
                    .segments
                    .insert(index, Segment::new(SegmentKind::Context, section.content.clone()));
                debug!(
                    contract = ?request.contract,
                    origin = %section.origin,
                    index,
                    chars = section.content.chars().count(),
                    "Context section injected"
                );
            }
            Placement::Skip(reason) => {
                if reason != SkipReason::EmptySection {
                    debug!(contract = ?request.contract, origin = %section.origin, %reason, "Context section skipped");
                }
            }
        }
        placements.push(placement);
    }
    (request, placements)
}
