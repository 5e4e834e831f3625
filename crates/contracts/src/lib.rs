//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the series dispatcher.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Idle completion is measured on a monotonic clock (`std::time::Instant`)
//! - Instances carry no timestamps of their own; arrival order is the only ordering

mod blueprint;
mod error;
mod instance;
mod payload;
mod series;
mod sink;
mod source;

pub use blueprint::*;
pub use error::*;
pub use instance::Instance;
pub use payload::SeriesPayload;
pub use series::CompletedSeries;
pub use sink::*;
pub use source::InstanceSource;
