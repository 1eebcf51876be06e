//! Domain event system: decoupled observation of turns.
//!
//! The pipeline publishes events as stages finish. Subscribers (the CLI
//! report, tests) react without being wired into the pipeline itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A pipeline stage finished (completed, skipped, or degraded)
    StageFinished {
        stage: String,
        status: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A context section was placed into a generation request
    ContextInjected {
        tool: String,
        origin: String,
        chars: usize,
        position: usize,
        timestamp: DateTime<Utc>,
    },

    /// A turn produced its artifact
    TurnCompleted {
        session: String,
        tool: String,
        degraded: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
