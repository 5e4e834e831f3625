//! ServiceBlueprint - Config Loader output
//!
//! Describes the complete service configuration: grouping timing, delivery target,
//! collector service and instance source.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete service configuration blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Grouping scheduler settings
    #[serde(default)]
    pub grouping: GroupingConfig,

    /// Delivery settings
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Collector service settings
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Instance source settings
    #[serde(default)]
    pub source: SourceConfig,
}

/// Grouping scheduler configuration
///
/// `idle_timeout_ms` governs grouping semantics, `tick_interval_ms` governs
/// responsiveness; the two are independent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Idle time after which a series is considered complete
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Polling period of the scheduler loop
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// What to do with an instance that does not match the current series
    #[serde(default)]
    pub mismatch_policy: MismatchPolicy,

    /// Dispatch the open series on shutdown instead of discarding it
    #[serde(default = "default_true")]
    pub flush_on_shutdown: bool,

    /// Upper bound for awaiting in-flight deliveries on shutdown
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl GroupingConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: default_idle_timeout_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            mismatch_policy: MismatchPolicy::default(),
            flush_on_shutdown: true,
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

fn default_idle_timeout_ms() -> u64 {
    1000
}

fn default_tick_interval_ms() -> u64 {
    200
}

fn default_shutdown_grace_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

/// Policy for instances whose series identifier differs from the open series
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Log and drop the instance; the open series is unaffected
    #[default]
    Drop,
    /// Hand the open series to dispatch now and start a new series with the instance
    Rotate,
}

/// Delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Sink type
    #[serde(default)]
    pub sink: SinkType,

    /// Upsert endpoint (http sink only)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Timeout for a single delivery attempt
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl DeliveryConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            sink: SinkType::default(),
            endpoint: default_endpoint(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:8000/series".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5000
}

/// Sink type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// POST to the collector
    #[default]
    Http,
    /// Log only (debugging)
    Log,
}

/// Collector service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// SQLite database URL
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            database_url: default_database_url(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_database_url() -> String {
    "sqlite://series.db?mode=rwc".to_string()
}

/// Instance source configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Replay a JSON-lines recording instead of simulating a modality
    #[serde(default)]
    pub replay_path: Option<PathBuf>,

    /// Simulated modality settings
    #[serde(default)]
    pub mock: MockModalityConfig,
}

/// Simulated modality configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MockModalityConfig {
    /// Number of series to send
    pub series_count: u32,
    /// Instances per series
    pub instances_per_series: u32,
    /// Delay between instances of one series
    pub instance_interval_ms: u64,
    /// Silence between two series
    pub series_gap_ms: u64,
    /// Subject identifier stamped on every instance
    pub patient_id: String,
    /// Subject display name stamped on every instance
    pub patient_name: String,
}

impl Default for MockModalityConfig {
    fn default() -> Self {
        Self {
            series_count: 3,
            instances_per_series: 10,
            instance_interval_ms: 50,
            series_gap_ms: 2000,
            patient_id: "123".to_string(),
            patient_name: "Doe^John".to_string(),
        }
    }
}
