//! # Collector
//!
//! Downstream series collector: an HTTP upsert endpoint backed by SQLite.
//!
//! Endpoints:
//! - `POST /series` upsert a series summary keyed by `SeriesInstanceUID`
//! - `GET /series` list stored summaries, newest first
//! - `GET /series/{uid}` fetch one summary (404 when absent)
//! - `GET /health` liveness

mod error;
mod routes;
mod server;
mod store;

pub use contracts::SeriesPayload;
pub use error::{CollectorError, Result};
pub use routes::router;
pub use server::{serve, spawn};
pub use store::SeriesStore;
