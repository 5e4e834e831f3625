//! SeriesSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for delivery targets.

use crate::{ContractError, SeriesPayload};

/// Series delivery trait
///
/// Implementations must treat `deliver` as an idempotent upsert keyed by
/// `SeriesInstanceUID`. Deliveries run concurrently, so the sink is shared.
#[trait_variant::make(SeriesSink: Send)]
pub trait LocalSeriesSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one series summary
    ///
    /// # Errors
    /// Returns a delivery error on transport failure or endpoint rejection
    async fn deliver(&self, payload: &SeriesPayload) -> Result<(), ContractError>;
}
