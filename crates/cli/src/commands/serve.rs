//! `serve` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use super::load_blueprint;
use super::run::setup_shutdown_signal;
use crate::cli::ServeArgs;

/// Execute the `serve` command
pub async fn run_serve(args: &ServeArgs) -> Result<()> {
    let mut blueprint = load_blueprint(args.config.as_deref())?;

    if let Some(ref bind) = args.bind {
        blueprint.collector.bind = bind.clone();
    }
    if let Some(ref database_url) = args.database_url {
        blueprint.collector.database_url = database_url.clone();
    }
    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after CLI overrides")?;

    info!(
        bind = %blueprint.collector.bind,
        database_url = %blueprint.collector.database_url,
        "Starting collector"
    );

    collector::serve(&blueprint.collector, setup_shutdown_signal())
        .await
        .context("Collector failed")?;

    info!("Collector finished");
    Ok(())
}
