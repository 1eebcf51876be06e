//! # meetwise-context
//!
//! Context assembly for generation requests: selects relevant history,
//! synthesizes it into short insights, computes what changed since earlier
//! meetings and places the result into a tool's request without breaking
//! the request's output contract.
//!
//! Nothing here fails a turn. Optional stages return [`StageOutcome`] and
//! fall back to empty values when the model is unavailable or answers in
//! the wrong shape.

pub mod delta;
pub mod engine;
pub mod injection;
pub mod insights;
pub mod limits;
pub mod metrics;
pub mod outcome;
pub mod section;
pub mod selector;
pub mod text;

pub use delta::{DeltaCategory, DeltaEngine, DeltaReport};
pub use engine::ContextEngine;
pub use injection::{
    GenerationRequest, OutputContract, Placement, PlacementRule, Segment, SegmentKind, SkipReason, decide, inject,
    placement_rule,
};
pub use insights::{InsightField, InsightSynthesizer, SynthesizedInsights};
pub use limits::{ContextLimits, WindowPurpose, WindowSpec};
pub use metrics::{ContextMetrics, MetricsSnapshot};
pub use outcome::{DegradeReason, StageOutcome};
pub use section::{ContextSection, SectionOrigin, render_delta, render_insights};
pub use selector::{PastContextWindow, WindowItem, select_window};
