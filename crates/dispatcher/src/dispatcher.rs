//! Dispatcher - concurrent, fire-and-forget delivery of completed series

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, instrument, warn};

use contracts::{CompletedSeries, SeriesSink};

use crate::metrics::{DispatchMetrics, MetricsSnapshot};

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchStatus {
    Delivered,
    Failed {
        /// Error category, see `ContractError::kind`
        kind: &'static str,
        message: String,
    },
}

/// A settled delivery
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub series_instance_uid: String,
    /// Zero when the series could not be projected into a payload
    pub num_instances: u32,
    pub status: DispatchStatus,
    pub elapsed: Duration,
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        self.status == DispatchStatus::Delivered
    }

    /// Failure message, if any
    pub fn failure(&self) -> Option<&str> {
        match &self.status {
            DispatchStatus::Delivered => None,
            DispatchStatus::Failed { message, .. } => Some(message),
        }
    }

    /// Failure category, if any
    pub fn failure_kind(&self) -> Option<&'static str> {
        match &self.status {
            DispatchStatus::Delivered => None,
            DispatchStatus::Failed { kind, .. } => Some(kind),
        }
    }
}

/// Spawns one delivery task per completed series
///
/// The caller gives up ownership of the series at `dispatch`, so nothing can be
/// appended to it while it is being delivered. Delivery tasks run concurrently
/// with each other and with the caller.
pub struct Dispatcher<S> {
    sink: Arc<S>,
    tasks: JoinSet<DispatchOutcome>,
    metrics: Arc<DispatchMetrics>,
}

impl<S> Dispatcher<S>
where
    S: SeriesSink + Sync + 'static,
{
    pub fn new(sink: S) -> Self {
        Self {
            sink: Arc::new(sink),
            tasks: JoinSet::new(),
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Deliveries spawned but not yet reaped
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Hand a completed series over to a new delivery task
    ///
    /// Returns immediately; the outcome is collected by `reap` or `drain`.
    #[instrument(
        name = "dispatcher_dispatch",
        skip(self, series),
        fields(sink = %self.sink.name(), series_instance_uid = %series.series_instance_uid())
    )]
    pub fn dispatch<B: CompletedSeries>(&mut self, series: B) {
        let sink = Arc::clone(&self.sink);
        let metrics = Arc::clone(&self.metrics);

        metrics.inc_started();
        debug!(in_flight = self.tasks.len() + 1, "delivery spawned");

        self.tasks.spawn(async move {
            let started = Instant::now();
            let series_instance_uid = series.series_instance_uid().to_string();

            let (num_instances, result) = match series.to_payload() {
                Ok(payload) => (payload.num_instances, sink.deliver(&payload).await),
                Err(e) => (0, Err(e)),
            };

            let elapsed = started.elapsed();
            let status = match result {
                Ok(()) => {
                    metrics.inc_delivered();
                    info!(
                        sink = %sink.name(),
                        series_instance_uid = %series_instance_uid,
                        num_instances,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "series delivered"
                    );
                    DispatchStatus::Delivered
                }
                Err(e) => {
                    metrics.inc_failure();
                    error!(
                        sink = %sink.name(),
                        series_instance_uid = %series_instance_uid,
                        error = %e,
                        "series delivery failed"
                    );
                    DispatchStatus::Failed {
                        kind: e.kind(),
                        message: e.to_string(),
                    }
                }
            };

            DispatchOutcome {
                series_instance_uid,
                num_instances,
                status,
                elapsed,
            }
        });
    }

    /// Collect deliveries that have already settled, without waiting
    pub fn reap(&mut self) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();
        while let Some(joined) = self.tasks.try_join_next() {
            if let Some(outcome) = self.settle(joined) {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    /// Await outstanding deliveries for at most `grace`
    ///
    /// Deliveries still running after the grace period are cancelled.
    #[instrument(name = "dispatcher_drain", skip(self), fields(in_flight = self.tasks.len()))]
    pub async fn drain(&mut self, grace: Duration) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();
        let deadline = tokio::time::sleep(grace);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                joined = self.tasks.join_next() => match joined {
                    Some(joined) => {
                        if let Some(outcome) = self.settle(joined) {
                            outcomes.push(outcome);
                        }
                    }
                    None => break,
                },
                _ = &mut deadline => {
                    let abandoned = self.tasks.len();
                    warn!(abandoned, "shutdown grace elapsed, cancelling deliveries");
                    self.tasks.abort_all();
                    while self.tasks.join_next().await.is_some() {}
                    self.metrics.add_abandoned(abandoned);
                    break;
                }
            }
        }

        info!(settled = outcomes.len(), "dispatcher drained");
        outcomes
    }

    fn settle(&self, joined: Result<DispatchOutcome, JoinError>) -> Option<DispatchOutcome> {
        match joined {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                self.metrics.inc_failure();
                error!(sink = %self.sink.name(), error = %e, "delivery task panicked");
                None
            }
        }
    }
}
