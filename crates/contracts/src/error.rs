//! Layered error definitions
//!
//! Categorized by source: config / series / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Series Errors =====
    /// A buffer without instances was asked for its payload
    #[error("series '{series_instance_uid}' has no instances")]
    EmptySeries { series_instance_uid: String },

    // ===== Sink Errors =====
    /// Sink delivery error (transport failure or rejected by the endpoint)
    #[error("sink '{sink_name}' delivery error: {message}")]
    SinkDelivery { sink_name: String, message: String },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sink delivery error
    pub fn sink_delivery(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkDelivery {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Stable label for the error category, safe to use as a metric or map key
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigParse { .. } => "config_parse",
            Self::ConfigValidation { .. } => "config_validation",
            Self::EmptySeries { .. } => "empty_series",
            Self::SinkDelivery { .. } => "sink_delivery",
            Self::SinkConnection { .. } => "sink_connection",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }

    /// Create sink connection error
    pub fn sink_connection(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkConnection {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_ignores_message_details() {
        let a = ContractError::EmptySeries {
            series_instance_uid: "1.2.3.4".into(),
        };
        let b = ContractError::EmptySeries {
            series_instance_uid: "5.6.7.8".into(),
        };
        assert_ne!(a.to_string(), b.to_string());
        assert_eq!(a.kind(), b.kind());

        let rejected = ContractError::sink_delivery("http", "endpoint returned 500: boom");
        assert_eq!(rejected.kind(), "sink_delivery");
        assert_eq!(ContractError::sink_connection("http", "bad url").kind(), "sink_connection");
    }
}
