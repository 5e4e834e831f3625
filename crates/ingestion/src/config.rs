//! Ingestion metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Instances pushed by producers
    pub instances_received: AtomicU64,

    /// Instances popped by the consumer
    pub instances_drained: AtomicU64,

    /// Pushes refused because the queue was closed
    pub push_errors: AtomicU64,

    /// Current queue length
    pub queue_len: AtomicUsize,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.instances_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drained(&self) {
        self.instances_drained.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_push_error(&self) {
        self.push_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            instances_received: self.instances_received.load(Ordering::Relaxed),
            instances_drained: self.instances_drained.load(Ordering::Relaxed),
            push_errors: self.push_errors.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub instances_received: u64,
    pub instances_drained: u64,
    pub push_errors: u64,
    pub queue_len: usize,
}
