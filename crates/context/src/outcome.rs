//! Two-outcome results for optional context stages.
//!
//! A stage either succeeds or degrades to an empty value with a reason.
//! Neither variant is an error: callers always get a usable value.

use meetwise_core::error::ModelError;
use serde::Serialize;

/// Why an optional stage fell back to its empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DegradeReason {
    /// The model or store call failed or timed out
    UpstreamUnavailable(String),
    /// The upstream answered, but not in the expected shape
    MalformedUpstreamResponse(String),
}

impl std::fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegradeReason::UpstreamUnavailable(detail) => write!(f, "upstream unavailable: {detail}"),
            DegradeReason::MalformedUpstreamResponse(detail) => {
                write!(f, "malformed upstream response: {detail}")
            }
        }
    }
}

impl From<ModelError> for DegradeReason {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::MalformedResponse(detail) => DegradeReason::MalformedUpstreamResponse(detail),
            other => DegradeReason::UpstreamUnavailable(other.to_string()),
        }
    }
}

/// The result of an optional stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    Ok(T),
    Degraded { value: T, reason: DegradeReason },
}

impl<T> StageOutcome<T> {
    pub fn degraded(value: T, reason: impl Into<DegradeReason>) -> Self {
        StageOutcome::Degraded {
            value,
            reason: reason.into(),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            StageOutcome::Ok(value) | StageOutcome::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            StageOutcome::Ok(value) | StageOutcome::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, StageOutcome::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&DegradeReason> {
        match self {
            StageOutcome::Ok(_) => None,
            StageOutcome::Degraded { reason, .. } => Some(reason),
        }
    }

    /// Split into the value and the degrade reason, if any.
    pub fn into_parts(self) -> (T, Option<DegradeReason>) {
        match self {
            StageOutcome::Ok(value) => (value, None),
            StageOutcome::Degraded { value, reason } => (value, Some(reason)),
        }
    }
}

impl<T: Default> StageOutcome<T> {
    /// Degrade to `T::default()`.
    pub fn empty(reason: impl Into<DegradeReason>) -> Self {
        Self::degraded(T::default(), reason)
    }
}
