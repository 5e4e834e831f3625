//! Grouping and dispatch metrics
//!
//! Recorders emit through the `metrics` facade; `GroupingStatsAggregator` keeps an
//! in-memory view of a run for the end-of-run summary.

use std::collections::HashMap;
use std::time::Duration;

use metrics::{counter, gauge, histogram};

/// Distinct failure reasons kept before further ones are folded into `OVERFLOW_REASON`
pub const MAX_FAILURE_REASONS: usize = 32;

/// Bucket for failure reasons beyond `MAX_FAILURE_REASONS`
pub const OVERFLOW_REASON: &str = "other";

/// Record an instance drained from a source
pub fn record_instance_received(source: &str) {
    counter!(
        "series_dispatcher_instances_received_total",
        "source" => source.to_string()
    )
    .increment(1);
}

/// Record an instance refused by the open series
pub fn record_instance_rejected(policy: &str) {
    counter!(
        "series_dispatcher_instances_rejected_total",
        "policy" => policy.to_string()
    )
    .increment(1);
}

/// Record a newly opened series buffer
pub fn record_series_opened() {
    counter!("series_dispatcher_series_opened_total").increment(1);
}

/// Record a settled delivery
pub fn record_series_dispatched(sink: &str, success: bool, num_instances: u32, latency: Duration) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "series_dispatcher_series_dispatched_total",
        "sink" => sink.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!("series_dispatcher_series_size").record(num_instances as f64);
    histogram!(
        "series_dispatcher_dispatch_latency_ms",
        "sink" => sink.to_string()
    )
    .record(latency.as_secs_f64() * 1000.0);
}

/// Record a tick with nothing to do (liveness)
pub fn record_idle_tick() {
    counter!("series_dispatcher_idle_ticks_total").increment(1);
    gauge!("series_dispatcher_open_series").set(0.0);
}

/// Grouping run aggregator
///
/// Aggregates settled deliveries in memory for summary output.
#[derive(Debug, Clone, Default)]
pub struct GroupingStatsAggregator {
    /// Settled deliveries
    pub total_dispatched: u64,

    /// Failed deliveries
    pub total_failed: u64,

    /// Instances per dispatched series
    pub series_size: RunningStats,

    /// Delivery latency (ms)
    pub latency_ms: RunningStats,

    /// Failure count per error kind, at most `MAX_FAILURE_REASONS + 1` entries
    pub failure_reasons: HashMap<String, u64>,
}

impl GroupingStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one settled delivery into the aggregate
    ///
    /// `failure` is the error kind, not the full message.
    pub fn update(&mut self, num_instances: u32, latency: Duration, failure: Option<&str>) {
        self.total_dispatched += 1;
        self.series_size.push(num_instances as f64);
        self.latency_ms.push(latency.as_secs_f64() * 1000.0);

        if let Some(reason) = failure {
            self.total_failed += 1;
            let key = if self.failure_reasons.contains_key(reason)
                || self.failure_reasons.len() < MAX_FAILURE_REASONS
            {
                reason
            } else {
                OVERFLOW_REASON
            };
            *self.failure_reasons.entry(key.to_string()).or_insert(0) += 1;
        }
    }

    pub fn summary(&self) -> SummaryReport {
        SummaryReport {
            total_dispatched: self.total_dispatched,
            total_failed: self.total_failed,
            failure_rate: if self.total_dispatched > 0 {
                self.total_failed as f64 / self.total_dispatched as f64 * 100.0
            } else {
                0.0
            },
            series_size: StatsSummary::from(&self.series_size),
            latency_ms: StatsSummary::from(&self.latency_ms),
            failure_reasons: self.failure_reasons.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Summary of a grouping run
#[derive(Debug, Clone, Default)]
pub struct SummaryReport {
    pub total_dispatched: u64,
    pub total_failed: u64,
    pub failure_rate: f64,
    pub series_size: StatsSummary,
    pub latency_ms: StatsSummary,
    pub failure_reasons: HashMap<String, u64>,
}

impl std::fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Summary ===")?;
        writeln!(f, "Series dispatched: {}", self.total_dispatched)?;
        writeln!(
            f,
            "Failed deliveries: {} ({:.2}%)",
            self.total_failed, self.failure_rate
        )?;
        writeln!(f, "Series size: {}", self.series_size)?;
        writeln!(f, "Delivery latency (ms): {}", self.latency_ms)?;

        if !self.failure_reasons.is_empty() {
            writeln!(f, "Failure reasons:")?;
            for (reason, count) in &self.failure_reasons {
                writeln!(f, "  {}: {}", reason, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
