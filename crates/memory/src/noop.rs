//! No-op store: disables persistent memory entirely.

use async_trait::async_trait;
use meetwise_core::error::MemoryError;
use meetwise_core::memory::{MemoryRecord, MemoryStore, SessionId};

/// A no-op store that remembers nothing. Every turn sees an empty history.
pub struct NoopStore;

#[async_trait]
impl MemoryStore for NoopStore {
    fn name(&self) -> &str {
        "none"
    }

    async fn query(&self, _session: &SessionId) -> Result<Vec<MemoryRecord>, MemoryError> {
        Ok(Vec::new())
    }

    async fn append(&self, _session: &SessionId, _record: MemoryRecord) -> Result<(), MemoryError> {
        Ok(())
    }
}
