//! Counters for context-assembly events worth watching.
//!
//! Nothing reads these to change behavior; they exist for logs and the
//! turn report.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ContextMetrics {
    model_calls: AtomicU64,
    items_truncated: AtomicU64,
    sections_truncated: AtomicU64,
    insights_degraded: AtomicU64,
    deltas_degraded: AtomicU64,
    sections_injected: AtomicU64,
    sections_skipped: AtomicU64,
}

/// A point-in-time copy of [`ContextMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub model_calls: u64,
    pub items_truncated: u64,
    pub sections_truncated: u64,
    pub insights_degraded: u64,
    pub deltas_degraded: u64,
    pub sections_injected: u64,
    pub sections_skipped: u64,
}

impl MetricsSnapshot {
    /// Total budget-exceeded truncations (items plus whole sections).
    pub fn budget_exceeded(&self) -> u64 {
        self.items_truncated + self.sections_truncated
    }
}

impl ContextMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_model_call(&self) {
        self.model_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_items_truncated(&self, count: usize) {
        self.items_truncated.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_section_truncated(&self) {
        self.sections_truncated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_insights_degraded(&self) {
        self.insights_degraded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delta_degraded(&self) {
        self.deltas_degraded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_injected(&self) {
        self.sections_injected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.sections_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            model_calls: self.model_calls.load(Ordering::Relaxed),
            items_truncated: self.items_truncated.load(Ordering::Relaxed),
            sections_truncated: self.sections_truncated.load(Ordering::Relaxed),
            insights_degraded: self.insights_degraded.load(Ordering::Relaxed),
            deltas_degraded: self.deltas_degraded.load(Ordering::Relaxed),
            sections_injected: self.sections_injected.load(Ordering::Relaxed),
            sections_skipped: self.sections_skipped.load(Ordering::Relaxed),
        }
    }
}
