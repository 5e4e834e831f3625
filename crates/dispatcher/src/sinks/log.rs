//! LogSink - logs series summaries via tracing

use contracts::{ContractError, SeriesPayload, SeriesSink};
use tracing::{info, instrument};

/// Sink that logs series summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SeriesSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_deliver",
        skip(self, payload),
        fields(sink = %self.name, series_instance_uid = %payload.series_instance_uid)
    )]
    async fn deliver(&self, payload: &SeriesPayload) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            patient_id = ?payload.patient_id,
            patient_name = ?payload.patient_name,
            study_instance_uid = ?payload.study_instance_uid,
            num_instances = payload.num_instances,
            "SeriesPayload received"
        );
        Ok(())
    }
}
