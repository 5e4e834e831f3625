//! Pipeline statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot as DispatchSnapshot;
use grouping::{SchedulerCounters, StopReason};
use observability::SummaryReport;

/// Statistics from a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Why the scheduler loop ended
    pub stop_reason: StopReason,

    /// Instances pushed by the source
    pub instances_received: u64,

    /// Scheduler routing counters
    pub counters: SchedulerCounters,

    /// Dispatcher task counters
    pub dispatch: DispatchSnapshot,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Per-series delivery aggregates
    pub report: SummaryReport,
}

impl PipelineStats {
    /// Delivered series per second
    pub fn series_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.dispatch.delivered_count as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Stop reason: {:?}", self.stop_reason);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Instances received: {}", self.instances_received);
        println!("   ├─ Instances grouped: {}", self.counters.received);
        println!("   ├─ Instances rejected: {}", self.counters.rejected);
        println!("   ├─ Series opened: {}", self.counters.series_opened);
        println!("   └─ Series handed off: {}", self.counters.series_dispatched);

        println!("\n📮 Delivery");
        println!("   ├─ Delivered: {}", self.dispatch.delivered_count);
        println!("   ├─ Failed: {}", self.dispatch.failure_count);
        println!("   ├─ Abandoned at shutdown: {}", self.dispatch.abandoned_count);
        println!("   └─ Series/s: {:.2}", self.series_per_sec());

        println!("\n{}", self.report);
    }
}
