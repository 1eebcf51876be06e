//! `meetwise memory`: Store selection and history inspection.

use meetwise_config::{AppConfig, MemoryConfig};
use meetwise_core::error::MemoryError;
use meetwise_core::memory::{MemoryStore, SessionId};
use meetwise_memory::{InMemoryStore, NoopStore, SqliteStore};
use std::sync::Arc;

/// Open the store named by `memory.backend`.
pub async fn open_store(config: &MemoryConfig) -> Result<Arc<dyn MemoryStore>, MemoryError> {
    match config.backend.as_str() {
        "sqlite" => {
            let path = config.resolved_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| MemoryError::Storage(format!("Cannot create {}: {e}", parent.display())))?;
            }
            let store = SqliteStore::new(&path.to_string_lossy()).await?;
            Ok(Arc::new(store))
        }
        "in_memory" => Ok(Arc::new(InMemoryStore::new())),
        "none" => Ok(Arc::new(NoopStore)),
        other => Err(MemoryError::Storage(format!("unknown memory backend '{other}'"))),
    }
}

pub async fn list(session: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = open_store(&config.memory).await?;
    let records = store.query(&SessionId::new(session)).await?;

    println!("🧠 Session '{session}' ({} backend)", store.name());
    if records.is_empty() {
        println!("   No records.");
        return Ok(());
    }

    for (i, record) in records.iter().enumerate() {
        let preview: String = record.value.chars().take(80).collect();
        let preview = preview.replace('\n', " ");
        println!(
            "  {i:>3}. {} [{}] {preview}",
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.key
        );
        if let Some(tool) = record.tool_used() {
            println!("       tool: {tool}");
        }
    }

    Ok(())
}
