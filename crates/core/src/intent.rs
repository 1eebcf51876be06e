//! Recognized user intent.

use serde::{Deserialize, Serialize};
use crate::tool::ToolKind;

/// Details pulled out of the user's message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// What the user wants from this turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub tool: ToolKind,
    pub confidence: f32,
    #[serde(default)]
    pub extracted: ExtractedInfo,
}

impl Intent {
    /// The intent used when recognition fails.
    pub fn general_fallback() -> Self {
        Self {
            tool: ToolKind::General,
            confidence: 0.5,
            extracted: ExtractedInfo::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_general_half_confidence() {
        let intent = Intent::general_fallback();
        assert_eq!(intent.tool, ToolKind::General);
        assert!((intent.confidence - 0.5).abs() < f32::EPSILON);
        assert!(intent.extracted.client_name.is_none());
    }
}
