//! # Grouping
//!
//! Idle-timeout series grouping engine.
//!
//! Responsibilities:
//! - Drain the instance source in arrival order
//! - Accumulate instances of the open series in a `SeriesBuffer`
//! - Treat a series as complete once it has been idle longer than the timeout
//! - Hand each completed series to the dispatcher exactly once
//!
//! ## Usage Example
//!
//! ```ignore
//! use grouping::{GroupingConfig, GroupingScheduler};
//!
//! let mut scheduler = GroupingScheduler::new(GroupingConfig::default(), queue, sink);
//!
//! // Tick until Ctrl+C or until the source is closed and drained
//! scheduler.run_until(tokio::signal::ctrl_c()).await;
//! println!("{}", scheduler.stats().summary());
//! ```

mod buffer;
mod clock;
mod scheduler;

// Re-exports
pub use buffer::SeriesBuffer;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use contracts::{GroupingConfig, Instance, InstanceSource, MismatchPolicy, SeriesPayload};
pub use scheduler::{GroupingScheduler, SchedulerCounters, SlotState, StopReason, TickReport};
