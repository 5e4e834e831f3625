//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Series Dispatcher - groups streamed instances into series and forwards them
#[derive(Parser, Debug)]
#[command(
    name = "series-dispatcher",
    author,
    version,
    about = "Idle-timeout series grouping and dispatch service",
    long_about = "Receives individually arriving instances, groups them into series using an\n\
                  idle timeout, and forwards each completed series summary to a collector.\n\n\
                  The collector itself can be served with the `serve` subcommand."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SERIES_DISPATCHER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SERIES_DISPATCHER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the grouping pipeline against the configured source and sink
    Run(RunArgs),

    /// Serve the collector endpoint
    Serve(ServeArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "SERIES_DISPATCHER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the collector endpoint
    #[arg(long, env = "SERIES_DISPATCHER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Override the delivery sink
    #[arg(long, value_enum)]
    pub sink: Option<SinkArg>,

    /// Override the idle timeout in milliseconds
    #[arg(long, env = "SERIES_DISPATCHER_IDLE_TIMEOUT_MS")]
    pub idle_timeout_ms: Option<u64>,

    /// Override the scheduler tick interval in milliseconds
    #[arg(long)]
    pub tick_interval_ms: Option<u64>,

    /// Replay a JSON-lines recording instead of the simulated modality
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Also serve the collector in this process and deliver to it
    #[arg(long)]
    pub with_collector: bool,

    /// Pipeline timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "SERIES_DISPATCHER_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "SERIES_DISPATCHER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `serve` command
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "SERIES_DISPATCHER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long, env = "SERIES_COLLECTOR_BIND")]
    pub bind: Option<String>,

    /// Override the SQLite database URL
    #[arg(long, env = "SERIES_COLLECTOR_DATABASE_URL")]
    pub database_url: Option<String>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Delivery sink override
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SinkArg {
    Http,
    Log,
}

impl From<SinkArg> for contracts::SinkType {
    fn from(sink: SinkArg) -> Self {
        match sink {
            SinkArg::Http => Self::Http,
            SinkArg::Log => Self::Log,
        }
    }
}
