//! # Series Dispatcher CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Grouping pipeline orchestration with graceful shutdown
//! - The downstream collector service

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_pipeline, run_serve, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Series Dispatcher CLI starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_pipeline(args).await,
        Commands::Serve(args) => run_serve(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
///
/// `-q` pins the level to `warn`; otherwise `RUST_LOG` wins over `-v`.
fn init_logging(cli: &Cli) -> Result<()> {
    match log_level(cli) {
        (level, true) => observability::init_tracing_fixed(cli.log_format.into(), level),
        (level, false) => observability::init_tracing(cli.log_format.into(), level),
    }
}

/// Level to log at and whether it overrides the environment
fn log_level(cli: &Cli) -> (&'static str, bool) {
    if cli.quiet {
        return ("warn", true);
    }
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    (level, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_forces_warn() {
        let cli = Cli::parse_from(["series-dispatcher", "-q", "info"]);
        assert_eq!(log_level(&cli), ("warn", true));
    }

    #[test]
    fn test_verbosity_is_a_default_level() {
        let cli = Cli::parse_from(["series-dispatcher", "-vv", "info"]);
        assert_eq!(log_level(&cli), ("trace", false));
    }
}
