//! Grouping scheduler: the drain-and-check control loop.

use std::future::Future;

use contracts::{GroupingConfig, Instance, InstanceSource, MismatchPolicy, SeriesSink};
use dispatcher::{DispatchOutcome, Dispatcher, MetricsSnapshot};
use observability::{
    record_idle_tick, record_instance_received, record_instance_rejected, record_series_dispatched,
    record_series_opened, GroupingStatsAggregator,
};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::buffer::SeriesBuffer;
use crate::clock::{Clock, MonotonicClock};

/// State of the single series slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// No open series, no delivery running
    Empty,
    /// Open series still receiving instances
    Collecting,
    /// Open series idle past the timeout, dispatched on the next tick
    PendingDispatch,
    /// Slot handed over; delivery still running
    Dispatching,
}

/// Why the run loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Shutdown signal fired
    Shutdown,
    /// Source closed and everything it produced was dispatched
    SourceClosed,
}

/// What a single tick did
#[derive(Debug, Default)]
pub struct TickReport {
    /// Instances drained from the source
    pub received: usize,
    /// Instances refused by the open series
    pub rejected: usize,
    /// Buffers opened
    pub opened: usize,
    /// Buffers handed to the dispatcher
    pub dispatched: usize,
    /// Deliveries that settled since the previous tick
    pub settled: Vec<DispatchOutcome>,
    /// No open series and no delivery in flight once the tick finished
    pub slot_empty: bool,
}

impl TickReport {
    /// Nothing happened and there is nothing to wait for: queue empty, no open
    /// series, no delivery in flight
    pub fn is_idle(&self) -> bool {
        self.slot_empty
            && self.received == 0
            && self.dispatched == 0
            && self.settled.is_empty()
    }
}

/// Running totals over the scheduler's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerCounters {
    pub received: u64,
    pub rejected: u64,
    pub series_opened: u64,
    pub series_dispatched: u64,
    pub idle_ticks: u64,
}

/// Single-slot grouping scheduler
///
/// Owns the open `SeriesBuffer` (if any) and the dispatcher. Each tick first settles
/// finished deliveries, then drains every pending instance, then checks idle
/// completion. Draining before the idle check means a burst arriving right at the
/// timeout boundary extends the open series instead of splitting it.
pub struct GroupingScheduler<Src, S, C = MonotonicClock>
where
    S: SeriesSink + Sync + 'static,
{
    config: GroupingConfig,
    source: Src,
    dispatcher: Dispatcher<S>,
    clock: C,
    current: Option<SeriesBuffer>,
    counters: SchedulerCounters,
    stats: GroupingStatsAggregator,
}

impl<Src, S> GroupingScheduler<Src, S, MonotonicClock>
where
    Src: InstanceSource,
    S: SeriesSink + Sync + 'static,
{
    pub fn new(config: GroupingConfig, source: Src, sink: S) -> Self {
        Self::with_clock(config, source, sink, MonotonicClock)
    }
}

impl<Src, S, C> GroupingScheduler<Src, S, C>
where
    Src: InstanceSource,
    S: SeriesSink + Sync + 'static,
    C: Clock,
{
    /// Create a scheduler with an injected clock
    pub fn with_clock(config: GroupingConfig, source: Src, sink: S, clock: C) -> Self {
        Self {
            config,
            source,
            dispatcher: Dispatcher::new(sink),
            clock,
            current: None,
            counters: SchedulerCounters::default(),
            stats: GroupingStatsAggregator::new(),
        }
    }

    pub fn config(&self) -> &GroupingConfig {
        &self.config
    }

    /// Open series, if any
    pub fn current(&self) -> Option<&SeriesBuffer> {
        self.current.as_ref()
    }

    pub fn source(&self) -> &Src {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut Src {
        &mut self.source
    }

    pub fn counters(&self) -> SchedulerCounters {
        self.counters
    }

    /// Settled deliveries aggregated over the run
    pub fn stats(&self) -> &GroupingStatsAggregator {
        &self.stats
    }

    pub fn dispatch_metrics(&self) -> MetricsSnapshot {
        self.dispatcher.metrics()
    }

    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    /// Current slot state
    pub fn state(&self) -> SlotState {
        match &self.current {
            Some(buffer)
                if buffer.is_idle_complete(self.config.idle_timeout(), self.clock.now()) =>
            {
                SlotState::PendingDispatch
            }
            Some(_) => SlotState::Collecting,
            None if self.dispatcher.in_flight() > 0 => SlotState::Dispatching,
            None => SlotState::Empty,
        }
    }

    /// One drain-and-check cycle
    ///
    /// Never fails; delivery errors surface in the returned report.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport {
            settled: self.reap(),
            ..Default::default()
        };

        self.drain_source(&mut report);

        let now = self.clock.now();
        let idle_complete = self
            .current
            .as_ref()
            .is_some_and(|buffer| buffer.is_idle_complete(self.config.idle_timeout(), now));

        if idle_complete && !self.source.has_pending() && self.hand_off() {
            report.dispatched += 1;
        }

        report.slot_empty = self.current.is_none() && self.dispatcher.in_flight() == 0;
        if report.is_idle() {
            self.counters.idle_ticks += 1;
            record_idle_tick();
        }

        report
    }

    /// Tick until `shutdown` resolves or the source is closed and fully dispatched
    ///
    /// On shutdown the open series is dispatched when `flush_on_shutdown` is set,
    /// otherwise discarded. Running deliveries get `shutdown_grace_ms` to settle.
    #[instrument(
        name = "grouping_scheduler_run",
        skip(self, shutdown),
        fields(source = %self.source.name(), sink = %self.dispatcher.sink_name())
    )]
    pub async fn run_until<F>(&mut self, shutdown: F) -> StopReason
    where
        F: Future,
    {
        let mut ticker = tokio::time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            idle_timeout_ms = self.config.idle_timeout_ms,
            tick_interval_ms = self.config.tick_interval_ms,
            mismatch_policy = ?self.config.mismatch_policy,
            "grouping scheduler started"
        );

        let reason = loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break StopReason::Shutdown,
                _ = ticker.tick() => {
                    self.tick();
                    if self.source_exhausted() {
                        break StopReason::SourceClosed;
                    }
                }
            }
        };

        self.shutdown(reason).await;
        reason
    }

    /// Tick until the source is closed and fully dispatched
    pub async fn run(&mut self) -> StopReason {
        self.run_until(std::future::pending::<()>()).await
    }

    #[instrument(name = "grouping_scheduler_shutdown", skip(self))]
    async fn shutdown(&mut self, reason: StopReason) {
        let mut report = TickReport::default();
        self.drain_source(&mut report);

        if let Some(buffer) = &self.current {
            if self.config.flush_on_shutdown {
                info!(
                    series_instance_uid = %buffer.series_instance_uid(),
                    num_instances = buffer.count(),
                    "flushing open series"
                );
                self.hand_off();
            } else {
                warn!(
                    series_instance_uid = %buffer.series_instance_uid(),
                    num_instances = buffer.count(),
                    "discarding open series"
                );
                self.current = None;
            }
        }

        let outcomes = self.dispatcher.drain(self.config.shutdown_grace()).await;
        for outcome in &outcomes {
            self.record_outcome(outcome);
        }

        info!(
            series_dispatched = self.counters.series_dispatched,
            instances_received = self.counters.received,
            instances_rejected = self.counters.rejected,
            "grouping scheduler stopped"
        );
    }

    fn source_exhausted(&self) -> bool {
        self.source.is_closed()
            && !self.source.has_pending()
            && self.current.is_none()
            && self.dispatcher.in_flight() == 0
    }

    fn drain_source(&mut self, report: &mut TickReport) {
        while let Some(instance) = self.source.pop() {
            let now = self.clock.now();
            report.received += 1;
            self.counters.received += 1;
            record_instance_received(self.source.name());
            self.route(instance, now, report);
        }
    }

    fn route(&mut self, instance: Instance, now: std::time::Instant, report: &mut TickReport) {
        let Some(buffer) = self.current.as_mut() else {
            self.open(instance, now, report);
            return;
        };

        if buffer.matches(&instance) {
            buffer.add_instance(instance, now);
            return;
        }

        report.rejected += 1;
        self.counters.rejected += 1;

        match self.config.mismatch_policy {
            MismatchPolicy::Drop => {
                record_instance_rejected("drop");
                warn!(
                    current = %buffer.series_instance_uid(),
                    received = %instance.series_instance_uid,
                    "instance does not belong to the open series, dropped"
                );
            }
            MismatchPolicy::Rotate => {
                record_instance_rejected("rotate");
                info!(
                    current = %buffer.series_instance_uid(),
                    received = %instance.series_instance_uid,
                    "new series started before idle timeout, rotating"
                );
                if self.hand_off() {
                    report.dispatched += 1;
                }
                self.open(instance, now, report);
            }
        }
    }

    fn open(&mut self, instance: Instance, now: std::time::Instant, report: &mut TickReport) {
        debug!(series_instance_uid = %instance.series_instance_uid, "series opened");
        self.current = Some(SeriesBuffer::new(instance, now));
        report.opened += 1;
        self.counters.series_opened += 1;
        record_series_opened();
    }

    /// Move the open buffer out of the slot and into a delivery task
    fn hand_off(&mut self) -> bool {
        let Some(mut buffer) = self.current.take() else {
            return false;
        };

        // the slot only ever holds buffers that were never handed off
        let latched = buffer.try_begin_dispatch();
        debug_assert!(latched, "series in the slot was already dispatched");

        info!(
            series_instance_uid = %buffer.series_instance_uid(),
            num_instances = buffer.count(),
            idle_ms = buffer.idle_for(self.clock.now()).as_millis() as u64,
            "series complete, dispatching"
        );

        self.counters.series_dispatched += 1;
        self.dispatcher.dispatch(buffer);
        true
    }

    fn reap(&mut self) -> Vec<DispatchOutcome> {
        let outcomes = self.dispatcher.reap();
        for outcome in &outcomes {
            self.record_outcome(outcome);
        }
        outcomes
    }

    fn record_outcome(&mut self, outcome: &DispatchOutcome) {
        record_series_dispatched(
            self.dispatcher.sink_name(),
            outcome.is_delivered(),
            outcome.num_instances,
            outcome.elapsed,
        );
        self.stats
            .update(outcome.num_instances, outcome.elapsed, outcome.failure_kind());
    }
}
