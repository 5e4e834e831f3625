//! # Ingestion
//!
//! Instance ingestion module.
//!
//! Responsibilities:
//! - Provide the FIFO `InstanceSource` the grouping scheduler drains
//! - Expose a cloneable producer handle for whatever receives instances
//! - Simulate a modality and replay recordings when no device is attached
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{instance_queue, MockModality};
//!
//! let (feed, queue) = instance_queue("modality");
//! let modality = MockModality::new(Default::default());
//! modality.start(feed);
//! // hand `queue` to the grouping scheduler
//! ```

mod config;
mod error;
mod mock;
mod queue;
pub mod replay;

// Re-exports
pub use config::{IngestionMetrics, MetricsSnapshot};
pub use contracts::{Instance, InstanceSource};
pub use error::{IngestionError, Result};
pub use mock::{series_uid_for, MockModality};
pub use queue::{instance_queue, InstanceFeed, InstanceQueue};
