//! Integration seam: where calendar, video-call, CRM and email data enters.
//!
//! meetwise never talks to those services itself. A host wires an
//! `IntegrationSource` that resolves a query into `MeetingData`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::error::IntegrationError;
use crate::intent::ExtractedInfo;
use crate::tool::ToolKind;

/// Everything the generation tools may know about one meeting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeetingData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Calendar event date, display form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Recording date, display form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,

    /// An existing summary of this meeting, if one was stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,

    /// Past emails exchanged with the client, newest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tone_samples: Vec<String>,
}

impl MeetingData {
    /// Whether a non-blank transcript is available.
    pub fn has_transcript(&self) -> bool {
        self.transcript.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Attendees as a comma-separated display string.
    pub fn attendees_display(&self) -> Option<String> {
        if self.attendees.is_empty() {
            None
        } else {
            Some(self.attendees.join(", "))
        }
    }
}

/// What the pipeline asks the integrations for.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationQuery {
    pub tool: ToolKind,
    pub extracted: ExtractedInfo,
    /// A meeting the user picked explicitly (UI selection), wins over extraction
    pub selected_meeting: Option<String>,
}

#[async_trait]
pub trait IntegrationSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, query: &IntegrationQuery) -> std::result::Result<MeetingData, IntegrationError>;
}

/// No integrations configured; every fetch fails with `NotConfigured`.
pub struct NoIntegrations;

#[async_trait]
impl IntegrationSource for NoIntegrations {
    fn name(&self) -> &str {
        "none"
    }

    async fn fetch(&self, _query: &IntegrationQuery) -> std::result::Result<MeetingData, IntegrationError> {
        Err(IntegrationError::NotConfigured("no integration source wired".into()))
    }
}

/// Fixture-backed integrations: meetings keyed by id or client name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticIntegrations {
    /// Meetings by id
    #[serde(default)]
    pub meetings: HashMap<String, MeetingData>,

    /// Id of the meeting returned when nothing more specific matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_meeting: Option<String>,
}

impl StaticIntegrations {
    /// A source that always answers with the same meeting.
    pub fn single(meeting: MeetingData) -> Self {
        let mut meetings = HashMap::new();
        meetings.insert("default".to_string(), meeting);
        Self {
            meetings,
            default_meeting: Some("default".into()),
        }
    }

    /// Parse a fixture document (`{"meetings": {...}, "default_meeting": "..."}`).
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn by_client(&self, client: &str) -> Option<&MeetingData> {
        let needle = client.to_lowercase();
        let mut ids: Vec<&String> = self.meetings.keys().collect();
        ids.sort();
        ids.into_iter()
            .filter_map(|id| self.meetings.get(id))
            .find(|m| {
                m.client_name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
            })
    }
}

#[async_trait]
impl IntegrationSource for StaticIntegrations {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self, query: &IntegrationQuery) -> std::result::Result<MeetingData, IntegrationError> {
        let explicit = query
            .selected_meeting
            .as_ref()
            .or(query.extracted.meeting_id.as_ref());

        if let Some(id) = explicit {
            return self
                .meetings
                .get(id)
                .cloned()
                .ok_or_else(|| IntegrationError::MeetingNotFound(id.clone()));
        }

        if let Some(client) = &query.extracted.client_name {
            if let Some(meeting) = self.by_client(client) {
                return Ok(meeting.clone());
            }
        }

        self.default_meeting
            .as_ref()
            .and_then(|id| self.meetings.get(id))
            .cloned()
            .ok_or_else(|| IntegrationError::MeetingNotFound("no matching meeting".into()))
    }
}
