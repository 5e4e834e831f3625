//! Ingestion error types

use thiserror::Error;

/// Ingestion errors
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Queue closed, instance not accepted
    #[error("instance queue '{source_name}' is closed")]
    ChannelClosed {
        /// Queue name
        source_name: String,
    },

    /// Malformed recording line
    #[error("invalid recording at line {line}: {message}")]
    ReplayParse {
        /// 1-based line number
        line: usize,
        /// Parser message
        message: String,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ingestion Result alias
pub type Result<T> = std::result::Result<T, IngestionError>;
