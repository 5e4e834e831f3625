//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::ServiceBlueprint;
use std::time::Duration;
use tracing::info;

use super::load_blueprint;
use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let mut blueprint = load_blueprint(args.config.as_deref())?;
    apply_overrides(&mut blueprint, args);
    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after CLI overrides")?;

    info!(
        idle_timeout_ms = blueprint.grouping.idle_timeout_ms,
        tick_interval_ms = blueprint.grouping.tick_interval_ms,
        sink = ?blueprint.delivery.sink,
        endpoint = %blueprint.delivery.endpoint,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
        with_collector: args.with_collector,
    });

    let stats = pipeline
        .run(setup_shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        stop_reason = ?stats.stop_reason,
        delivered = stats.dispatch.delivered_count,
        failed = stats.dispatch.failure_count,
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline finished"
    );
    stats.print_summary();

    Ok(())
}

fn apply_overrides(blueprint: &mut ServiceBlueprint, args: &RunArgs) {
    if let Some(ref endpoint) = args.endpoint {
        info!(endpoint = %endpoint, "Overriding endpoint from CLI");
        blueprint.delivery.endpoint = endpoint.clone();
    }
    if let Some(sink) = args.sink {
        blueprint.delivery.sink = sink.into();
    }
    if let Some(idle_timeout_ms) = args.idle_timeout_ms {
        info!(idle_timeout_ms, "Overriding idle timeout from CLI");
        blueprint.grouping.idle_timeout_ms = idle_timeout_ms;
    }
    if let Some(tick_interval_ms) = args.tick_interval_ms {
        blueprint.grouping.tick_interval_ms = tick_interval_ms;
    }
    if let Some(ref replay) = args.replay {
        blueprint.source.replay_path = Some(replay.clone());
    }
}

/// Resolve on Ctrl+C or SIGTERM
pub(crate) async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &ServiceBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Grouping:");
    println!("  Idle timeout: {} ms", blueprint.grouping.idle_timeout_ms);
    println!("  Tick interval: {} ms", blueprint.grouping.tick_interval_ms);
    println!("  Mismatch policy: {:?}", blueprint.grouping.mismatch_policy);
    println!("  Flush on shutdown: {}", blueprint.grouping.flush_on_shutdown);
    println!("\nDelivery:");
    println!("  Sink: {:?}", blueprint.delivery.sink);
    println!("  Endpoint: {}", blueprint.delivery.endpoint);
    println!("\nSource:");
    match &blueprint.source.replay_path {
        Some(path) => println!("  Replay: {}", path.display()),
        None => println!(
            "  Mock modality: {} series x {} instances",
            blueprint.source.mock.series_count, blueprint.source.mock.instances_per_series
        ),
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use contracts::SinkType;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: RunArgs,
    }

    #[test]
    fn test_overrides_replace_blueprint_values() {
        let harness = Harness::parse_from([
            "run",
            "--endpoint",
            "http://10.0.0.5:8000/series",
            "--idle-timeout-ms",
            "400",
            "--sink",
            "log",
            "--replay",
            "session.jsonl",
        ]);
        let mut blueprint = ServiceBlueprint::default();

        apply_overrides(&mut blueprint, &harness.args);

        assert_eq!(blueprint.delivery.endpoint, "http://10.0.0.5:8000/series");
        assert_eq!(blueprint.grouping.idle_timeout_ms, 400);
        assert_eq!(blueprint.grouping.tick_interval_ms, 200);
        assert_eq!(blueprint.delivery.sink, SinkType::Log);
        assert_eq!(
            blueprint.source.replay_path.as_deref(),
            Some(std::path::Path::new("session.jsonl"))
        );
    }
}
