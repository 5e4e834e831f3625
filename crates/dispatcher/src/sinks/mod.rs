//! Sink implementations
//!
//! Contains HttpSink and LogSink, plus the config-driven `ConfiguredSink`.

mod http;
mod log;

pub use self::http::HttpSink;
pub use self::log::LogSink;

use contracts::{ContractError, DeliveryConfig, SeriesPayload, SeriesSink, SinkType};
use tracing::instrument;

use crate::error::DispatcherError;

/// Sink selected at runtime from configuration
pub enum ConfiguredSink {
    Http(HttpSink),
    Log(LogSink),
}

impl SeriesSink for ConfiguredSink {
    fn name(&self) -> &str {
        match self {
            Self::Http(sink) => sink.name(),
            Self::Log(sink) => sink.name(),
        }
    }

    async fn deliver(&self, payload: &SeriesPayload) -> Result<(), ContractError> {
        match self {
            Self::Http(sink) => sink.deliver(payload).await,
            Self::Log(sink) => sink.deliver(payload).await,
        }
    }
}

/// Create the delivery sink from configuration
#[instrument(name = "dispatcher_create_sink", skip(config), fields(sink_type = ?config.sink))]
pub fn create_sink(config: &DeliveryConfig) -> Result<ConfiguredSink, DispatcherError> {
    match config.sink {
        SinkType::Http => {
            let sink = HttpSink::new("http", &config.endpoint, config.request_timeout())
                .map_err(|e| DispatcherError::sink_creation("http", e.to_string()))?;
            Ok(ConfiguredSink::Http(sink))
        }
        SinkType::Log => Ok(ConfiguredSink::Log(LogSink::new("log"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sink_from_config() {
        let sink = create_sink(&DeliveryConfig::default()).unwrap();
        assert!(matches!(sink, ConfiguredSink::Http(_)));
        assert_eq!(sink.name(), "http");

        let config = DeliveryConfig {
            sink: SinkType::Log,
            ..Default::default()
        };
        assert!(matches!(create_sink(&config).unwrap(), ConfiguredSink::Log(_)));
    }

    #[test]
    fn test_create_sink_rejects_bad_endpoint() {
        let config = DeliveryConfig {
            endpoint: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_sink(&config),
            Err(DispatcherError::SinkCreation { .. })
        ));
    }
}
