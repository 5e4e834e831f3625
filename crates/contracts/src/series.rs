//! CompletedSeries trait - hand-off between grouping and dispatch
//!
//! The dispatcher only reads a completed series; it never mutates it.

use crate::{ContractError, SeriesPayload};

/// A frozen series handed over for delivery
///
/// Ownership moves to the dispatch task at the hand-off, so no instance can be
/// appended once delivery has started.
pub trait CompletedSeries: Send + 'static {
    /// Series identifier (upsert key)
    fn series_instance_uid(&self) -> &str;

    /// Project the series into its transport payload
    ///
    /// # Errors
    /// Returns `ContractError::EmptySeries` if the series holds no instances
    fn to_payload(&self) -> Result<SeriesPayload, ContractError>;
}
