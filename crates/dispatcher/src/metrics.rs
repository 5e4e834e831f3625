//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for one dispatcher
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Deliveries currently running
    in_flight: AtomicUsize,
    /// Total deliveries started
    started_count: AtomicU64,
    /// Total successful deliveries
    delivered_count: AtomicU64,
    /// Total failed deliveries
    failure_count: AtomicU64,
    /// Deliveries abandoned at shutdown
    abandoned_count: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// A delivery task was spawned
    pub fn inc_started(&self) {
        self.started_count.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    /// A delivery settled successfully
    pub fn inc_delivered(&self) {
        self.delivered_count.fetch_add(1, Ordering::Relaxed);
        self.dec_in_flight();
    }

    /// A delivery settled with an error
    pub fn inc_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        self.dec_in_flight();
    }

    /// Deliveries cancelled after the shutdown grace period
    pub fn add_abandoned(&self, count: usize) {
        self.abandoned_count
            .fetch_add(count as u64, Ordering::Relaxed);
        for _ in 0..count {
            self.dec_in_flight();
        }
    }

    fn dec_in_flight(&self) {
        let _ = self
            .in_flight
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            in_flight: self.in_flight(),
            started_count: self.started_count.load(Ordering::Relaxed),
            delivered_count: self.delivered_count.load(Ordering::Relaxed),
            failure_count: self.failure_count.load(Ordering::Relaxed),
            abandoned_count: self.abandoned_count.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub in_flight: usize,
    pub started_count: u64,
    pub delivered_count: u64,
    pub failure_count: u64,
    pub abandoned_count: u64,
}
