//! InstanceSource trait - grouping engine input
//!
//! Decouples the scheduler from whatever receives instances from the device.

use crate::Instance;

/// Non-blocking, FIFO instance source
///
/// The scheduler drains eagerly whenever `has_pending` is true; no back-pressure
/// signal flows back to the producer.
pub trait InstanceSource: Send {
    /// Source name (used for logging)
    fn name(&self) -> &str;

    /// Whether at least one instance is waiting
    fn has_pending(&self) -> bool;

    /// Pop the oldest waiting instance, if any
    fn pop(&mut self) -> Option<Instance>;

    /// Whether the source is permanently unavailable
    ///
    /// Instances still waiting are drained before the scheduler stops.
    fn is_closed(&self) -> bool;
}
