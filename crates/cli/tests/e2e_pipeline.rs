//! End-to-end tests for the meetwise turn pipeline.
//!
//! These drive full turns against a real SQLite store and a scripted
//! provider: history written by one turn feeds context into the next.

use std::sync::Arc;

use meetwise_agent::{Pipeline, Stage, StageStatus, TurnRequest, TurnStatus};
use meetwise_config::AppConfig;
use meetwise_context::Placement;
use meetwise_context::section::INSIGHTS_HEADER;
use meetwise_core::event::DomainEvent;
use meetwise_core::integration::StaticIntegrations;
use meetwise_core::memory::{MemoryStore, SessionId};
use meetwise_memory::SqliteStore;
use meetwise_providers::{ModelClient, ScriptedProvider};
use serde_json::json;

const FIXTURE: &str = r#"{
    "meetings": {
        "m1": {
            "title": "Acme QBR",
            "date": "2025-03-04",
            "recording_date": "2025-03-04",
            "attendees": ["Dana", "Lee"],
            "transcript": "Dana: we agreed to renew. Lee: pricing for volume tiers is still open.",
            "client_name": "Acme"
        },
        "m2": {
            "title": "Acme renewal call",
            "date": "2025-03-18",
            "client_name": "Acme"
        }
    },
    "default_meeting": "m1"
}"#;

const SUMMARY_TEXT: &str = "# Meeting Header\nAcme QBR\n\n## Discussion\nRenewal agreed; volume pricing open.";

fn provider() -> Arc<ScriptedProvider> {
    Arc::new(
        ScriptedProvider::new()
            .on_json(
                "User message: summarize the QBR",
                json!({"intent": "summarization", "confidence": 0.92, "extracted_info": {"client_name": "Acme"}}),
            )
            .on_json(
                "User message: get me ready for the renewal call",
                json!({"intent": "meeting_brief", "confidence": 0.88, "extracted_info": {"client_name": "Acme"}}),
            )
            .on_json("Plan the workflow", json!({"steps": [{"action": "retrieve_memory", "tool": "memory_retriever"}]}))
            .on_json(
                "Analyze the following past meeting interactions",
                json!({"client_history": "Acme renewed after the QBR", "open_loops": "volume pricing"}),
            )
            .on("Analyze the following meeting transcript", SUMMARY_TEXT)
            .on_json(
                "Based on the following meeting summary, extract",
                json!({"decisions": [{"description": "Renew for another year", "context": "QBR"}]}),
            )
            .on_json(
                "Generate a comprehensive meeting brief",
                json!({"key_topics": ["volume pricing"], "questions": ["Which tier fits?"]}),
            )
            .on_json("Extract information that should be remembered", json!({"last_client_selected": "Acme"})),
    )
}

async fn pipeline(provider: &Arc<ScriptedProvider>, store: Arc<dyn MemoryStore>) -> Pipeline {
    let config = AppConfig::default();
    let client = ModelClient::new(provider.clone(), "test");
    let integrations = StaticIntegrations::from_json(FIXTURE).unwrap();
    Pipeline::from_config(&config, client, store).with_integrations(Arc::new(integrations))
}

fn turn(message: &str, meeting: &str) -> TurnRequest {
    TurnRequest {
        session: SessionId::new("dana@example.com"),
        message: message.into(),
        selected_meeting: Some(meeting.into()),
        additional_context: None,
    }
}

#[tokio::test]
async fn summary_then_brief_carries_history_forward() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("memory.db");
    let store: Arc<dyn MemoryStore> = Arc::new(SqliteStore::new(&db.to_string_lossy()).await.unwrap());
    let provider = provider();
    let pipeline = pipeline(&provider, store.clone()).await;

    // Turn 1: no history yet, so nothing is injected.
    let first = pipeline.run_turn(turn("summarize the QBR", "m1")).await.unwrap();
    assert_eq!(first.status, TurnStatus::Completed);
    assert!(first.response.starts_with("## Summary\n"));
    assert!(first.response.contains("**Zoom Recording Date:** 2025-03-04"));
    assert!(first.response.contains("- Renew for another year"));
    assert!(matches!(first.stage(Stage::SelectContextWindow), Some(StageStatus::Skipped(_))));
    assert_eq!(first.plan.steps.len(), 1);

    // Turn 2: the stored summary becomes insight context for the brief.
    let second = pipeline
        .run_turn(turn("get me ready for the renewal call", "m2"))
        .await
        .unwrap();
    assert_eq!(second.status, TurnStatus::Completed);
    assert_eq!(second.stage(Stage::SynthesizeInsights), Some(&StageStatus::Completed));
    assert!(second.response.contains("## Key Topics"));

    let brief_prompt = provider
        .requests()
        .iter()
        .filter_map(|r| r.messages.last())
        .map(|m| m.content.clone())
        .find(|p| p.contains("Generate a comprehensive meeting brief"))
        .unwrap();
    assert!(brief_prompt.contains(INSIGHTS_HEADER));
    assert!(brief_prompt.contains("- Open loops: volume pricing"));
    assert!(brief_prompt.find(INSIGHTS_HEADER).unwrap() < brief_prompt.find("Meeting Information:").unwrap());

    let records = store.query(&SessionId::new("dana@example.com")).await.unwrap();
    let keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "interaction:summarization",
            "last_client_selected",
            "interaction:meeting_brief",
            "last_client_selected"
        ]
    );
    assert_eq!(records[0].value, SUMMARY_TEXT);
}

#[tokio::test]
async fn history_survives_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("memory.db");
    let provider = provider();

    {
        let store: Arc<dyn MemoryStore> = Arc::new(SqliteStore::new(&db.to_string_lossy()).await.unwrap());
        pipeline(&provider, store)
            .await
            .run_turn(turn("summarize the QBR", "m1"))
            .await
            .unwrap();
    }

    let store: Arc<dyn MemoryStore> = Arc::new(SqliteStore::new(&db.to_string_lossy()).await.unwrap());
    let report = pipeline(&provider, store)
        .await
        .run_turn(turn("get me ready for the renewal call", "m2"))
        .await
        .unwrap();
    let inserted = report
        .injections
        .iter()
        .filter(|i| matches!(i.placement, Placement::Insert(_)))
        .count();
    assert_eq!(inserted, 1);
    assert_eq!(report.metrics.sections_injected, 1);
}

#[tokio::test]
async fn turn_publishes_stage_and_completion_events() {
    let store: Arc<dyn MemoryStore> = Arc::new(meetwise_memory::InMemoryStore::new());
    let provider = provider();
    let pipeline = pipeline(&provider, store).await;
    let mut rx = pipeline.events().subscribe();

    pipeline.run_turn(turn("summarize the QBR", "m1")).await.unwrap();

    let mut stages = 0;
    let mut completed = None;
    while let Ok(event) = rx.try_recv() {
        match event.as_ref() {
            DomainEvent::StageFinished { .. } => stages += 1,
            DomainEvent::TurnCompleted { tool, degraded, .. } => completed = Some((tool.clone(), *degraded)),
            DomainEvent::ContextInjected { .. } => {}
        }
    }
    assert_eq!(stages, Stage::ALL.len());
    assert_eq!(completed, Some(("summarization".to_string(), false)));
}
