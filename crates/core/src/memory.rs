//! Memory store trait: the append-only record of past interactions.
//!
//! Every turn reads the full record set for its session and writes back
//! at most a handful of new records. Records are never updated in place.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::MemoryError;

/// Identifies whose history a record belongs to (a user, optionally scoped to a client).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self("default".into())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single timestamped interaction record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Record key (e.g. "interaction:summarization", "user_preferences")
    pub key: String,

    /// Free text. May be arbitrarily long and is untrusted.
    pub value: String,

    /// Open metadata. Every key is optional.
    #[serde(default)]
    pub extra_data: serde_json::Map<String, serde_json::Value>,

    /// When the record was written
    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    /// Create a record stamped with the current time and no metadata.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            extra_data: serde_json::Map::new(),
            created_at: Utc::now(),
        }
    }

    /// Attach a metadata field.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra_data.insert(key.into(), value.into());
        self
    }

    /// Override the timestamp.
    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// The generation tool that produced this record, when recorded as a string.
    pub fn tool_used(&self) -> Option<&str> {
        self.extra_data.get("tool_used").and_then(|v| v.as_str())
    }
}

/// Long-lived memory keys the fact extractor is steered towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryCategory {
    LastSelectedMeeting,
    LastClientSelected,
    UserPreferences,
    ClientPreferences,
    MeetingPatterns,
    SummarizationPatterns,
    ActionBehavior,
    ExtractedKnowledge,
}

impl MemoryCategory {
    pub const ALL: [MemoryCategory; 8] = [
        MemoryCategory::LastSelectedMeeting,
        MemoryCategory::LastClientSelected,
        MemoryCategory::UserPreferences,
        MemoryCategory::ClientPreferences,
        MemoryCategory::MeetingPatterns,
        MemoryCategory::SummarizationPatterns,
        MemoryCategory::ActionBehavior,
        MemoryCategory::ExtractedKnowledge,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            MemoryCategory::LastSelectedMeeting => "last_selected_meeting",
            MemoryCategory::LastClientSelected => "last_client_selected",
            MemoryCategory::UserPreferences => "user_preferences",
            MemoryCategory::ClientPreferences => "client_preferences",
            MemoryCategory::MeetingPatterns => "meeting_patterns",
            MemoryCategory::SummarizationPatterns => "summarization_patterns",
            MemoryCategory::ActionBehavior => "action_behavior",
            MemoryCategory::ExtractedKnowledge => "extracted_knowledge",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MemoryCategory::LastSelectedMeeting => "Tracks the most recent meeting the user interacted with.",
            MemoryCategory::LastClientSelected => "Tracks the most recent client the user referenced.",
            MemoryCategory::UserPreferences => "Long-term user-level writing tone, style, and behavior.",
            MemoryCategory::ClientPreferences => "Client-specific preferences captured during workflows.",
            MemoryCategory::MeetingPatterns => "Historical behavior patterns used for inference.",
            MemoryCategory::SummarizationPatterns => "User-specific summarization style preferences.",
            MemoryCategory::ActionBehavior => "How the user tends to follow up or delegate actions.",
            MemoryCategory::ExtractedKnowledge => "General extracted long-term memory not fitting a category.",
        }
    }
}

/// The MemoryStore trait.
///
/// Implementations: SQLite, in-memory (for testing), none (no-op).
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory", "none").
    fn name(&self) -> &str;

    /// All records for a session, in write order.
    async fn query(&self, session: &SessionId) -> std::result::Result<Vec<MemoryRecord>, MemoryError>;

    /// Append a record to a session's history.
    async fn append(&self, session: &SessionId, record: MemoryRecord) -> std::result::Result<(), MemoryError>;
}
