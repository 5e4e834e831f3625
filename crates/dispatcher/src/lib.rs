//! # Dispatcher
//!
//! Series delivery module.
//!
//! Responsibilities:
//! - Take ownership of a completed series and deliver it in its own task
//! - Never block the grouping loop on a slow or failing endpoint
//! - Report every settled delivery as a `DispatchOutcome`

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod sinks;

pub use contracts::{CompletedSeries, SeriesPayload, SeriesSink};
pub use dispatcher::{DispatchOutcome, DispatchStatus, Dispatcher};
pub use error::DispatcherError;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use sinks::{create_sink, ConfiguredSink, HttpSink, LogSink};
