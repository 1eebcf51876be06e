//! In-memory store: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use meetwise_core::error::MemoryError;
use meetwise_core::memory::{MemoryRecord, MemoryStore, SessionId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An in-memory store that keeps each session's records in a Vec.
/// Useful for testing and sessions where persistence isn't needed.
pub struct InMemoryStore {
    sessions: Arc<RwLock<HashMap<SessionId, Vec<MemoryRecord>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed a session with records, e.g. history fixtures in tests.
    pub async fn seed(&self, session: &SessionId, records: impl IntoIterator<Item = MemoryRecord>) {
        self.sessions
            .write()
            .await
            .entry(session.clone())
            .or_default()
            .extend(records);
    }

    /// Total records across all sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn query(&self, session: &SessionId) -> Result<Vec<MemoryRecord>, MemoryError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session)
            .cloned()
            .unwrap_or_default())
    }

    async fn append(&self, session: &SessionId, record: MemoryRecord) -> Result<(), MemoryError> {
        self.sessions
            .write()
            .await
            .entry(session.clone())
            .or_default()
            .push(record);
        Ok(())
    }
}
