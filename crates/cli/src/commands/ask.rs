//! `meetwise ask`: Run one turn through the pipeline.

use meetwise_agent::{Pipeline, StageStatus, TurnReport, TurnRequest};
use meetwise_config::AppConfig;
use meetwise_core::integration::{IntegrationSource, NoIntegrations, StaticIntegrations};
use meetwise_core::memory::SessionId;
use meetwise_providers::ModelClient;
use std::path::PathBuf;
use std::sync::Arc;

use super::memory::open_store;

pub struct AskArgs {
    pub message: String,
    pub session: String,
    pub meeting: Option<PathBuf>,
    pub select: Option<String>,
    pub context: Option<String>,
    pub report: bool,
}

pub async fn run(args: AskArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for an API key early so the error is clear
    if config.missing_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    MEETWISE_API_KEY    = 'sk-...'");
        eprintln!("    OPENROUTER_API_KEY  = 'sk-or-v1-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let client = ModelClient::from_config(&config)?;
    let store = open_store(&config.memory).await?;
    let integrations = load_integrations(args.meeting.as_deref())?;

    tracing::debug!(
        memory = store.name(),
        integrations = integrations.name(),
        model = client.model(),
        "Pipeline assembled"
    );
    let pipeline = Pipeline::from_config(&config, client, store).with_integrations(integrations);
    let request = TurnRequest {
        session: SessionId::new(args.session),
        message: args.message,
        selected_meeting: args.select,
        additional_context: args.context,
    };

    eprint!("  Thinking...");
    let result = pipeline.run_turn(request).await;
    eprint!("\r              \r");
    let report = result?;

    println!("{}", report.response);
    if args.report {
        println!();
        print!("{}", format_report(&report));
    }
    Ok(())
}

fn load_integrations(fixture: Option<&std::path::Path>) -> Result<Arc<dyn IntegrationSource>, Box<dyn std::error::Error>> {
    let Some(path) = fixture else {
        return Ok(Arc::new(NoIntegrations));
    };
    let json = std::fs::read_to_string(path).map_err(|e| format!("Cannot read {}: {e}", path.display()))?;
    let source = StaticIntegrations::from_json(&json).map_err(|e| format!("Invalid meeting fixture {}: {e}", path.display()))?;
    Ok(Arc::new(source))
}

/// The stage table printed by `--report`.
fn format_report(report: &TurnReport) -> String {
    let mut out = format!(
        "Intent: {} ({:.2})  Plan: {} steps\n\n",
        report.intent.tool,
        report.intent.confidence,
        report.plan.steps.len()
    );
    out.push_str(&format!("  {:<24} {:<10} {:>7}  {}\n", "STAGE", "STATUS", "MS", "NOTE"));
    for record in &report.stages {
        let note = match &record.status {
            StageStatus::Completed => "",
            StageStatus::Skipped(reason) | StageStatus::Degraded(reason) | StageStatus::Failed(reason) => reason.as_str(),
        };
        out.push_str(&format!(
            "  {:<24} {:<10} {:>7}  {note}\n",
            record.stage.as_str(),
            record.status.label(),
            record.duration_ms
        ));
    }
    for injection in &report.injections {
        out.push_str(&format!("\n  context {}: {:?}", injection.origin, injection.placement));
    }
    if !report.injections.is_empty() {
        out.push('\n');
    }
    out.push_str(&format!("\nStatus: {}  ({} ms)\n", report.status, report.duration_ms));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use meetwise_agent::{InjectionRecord, Stage, StageRecord, TurnStatus, WorkflowPlan};
    use meetwise_context::{MetricsSnapshot, Placement, SectionOrigin};
    use meetwise_core::intent::Intent;
    use meetwise_tools::Artifact;

    #[test]
    fn report_lists_stages_and_status() {
        let report = TurnReport {
            response: "hi".into(),
            artifact: Artifact::General { text: "hi".into() },
            intent: Intent::general_fallback(),
            plan: WorkflowPlan::default(),
            stages: vec![
                StageRecord {
                    stage: Stage::RecognizeIntent,
                    status: StageStatus::Completed,
                    duration_ms: 12,
                },
                StageRecord {
                    stage: Stage::SynthesizeInsights,
                    status: StageStatus::degraded("model call timed out"),
                    duration_ms: 60_000,
                },
            ],
            injections: vec![InjectionRecord {
                origin: SectionOrigin::Insights,
                placement: Placement::Insert(1),
            }],
            status: TurnStatus::CompletedDegraded,
            metrics: MetricsSnapshot::default(),
            duration_ms: 60_100,
        };

        let out = format_report(&report);
        assert!(out.contains("recognize_intent"));
        assert!(out.contains("degraded"));
        assert!(out.contains("model call timed out"));
        assert!(out.contains("context insights: Insert(1)"));
        assert!(out.ends_with("Status: COMPLETED_DEGRADED  (60100 ms)\n"));
    }

    #[test]
    fn missing_fixture_is_an_error() {
        assert!(load_integrations(Some(std::path::Path::new("/nonexistent/meeting.json"))).is_err());
        assert_eq!(load_integrations(None).unwrap().name(), "none");
    }
}
