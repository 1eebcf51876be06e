//! The meetwise turn pipeline.
//!
//! A turn runs a fixed sequence of stages:
//!
//! 1. **Recognize** the user's intent and **plan** the workflow
//! 2. **Retrieve** the session's memory and **fetch** meeting data
//! 3. **Assemble context**: select past summaries, synthesize insights,
//!    compute what changed and render the sections
//! 4. **Execute** the chosen tool with context injected where it is safe
//! 5. **Annotate** summaries with a post-hoc delta, render the response
//! 6. **Write** the turn back to memory
//!
//! Only tool execution can fail a turn. Every other stage degrades to an
//! empty value and the turn ends as `COMPLETED_DEGRADED`.

pub mod intent;
pub mod pipeline;
pub mod planner;
pub mod stage;
pub mod synthesis;
pub mod writer;

pub use intent::IntentRecognizer;
pub use pipeline::{InjectionRecord, Pipeline, PipelineError, PipelineOptions, TurnReport, TurnRequest};
pub use planner::{PlanStep, WorkflowPlan, WorkflowPlanner};
pub use stage::{Stage, StageRecord, StageStatus, TurnStatus};
pub use synthesis::render_response;
pub use writer::{MemoryWriter, TurnMemory};
