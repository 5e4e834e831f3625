//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{MismatchPolicy, ServiceBlueprint, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    idle_timeout_ms: u64,
    tick_interval_ms: u64,
    sink: String,
    endpoint: String,
    source: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let source = match &blueprint.source.replay_path {
                Some(path) => format!("replay {}", path.display()),
                None => "mock modality".to_string(),
            };

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    idle_timeout_ms: blueprint.grouping.idle_timeout_ms,
                    tick_interval_ms: blueprint.grouping.tick_interval_ms,
                    sink: format!("{:?}", blueprint.delivery.sink),
                    endpoint: blueprint.delivery.endpoint.clone(),
                    source,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &ServiceBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let grouping = &blueprint.grouping;

    if grouping.tick_interval_ms > grouping.idle_timeout_ms {
        warnings.push(format!(
            "tick_interval_ms ({}) exceeds idle_timeout_ms ({}) - completion detection lags by up to a tick",
            grouping.tick_interval_ms, grouping.idle_timeout_ms
        ));
    }

    if grouping.mismatch_policy == MismatchPolicy::Drop {
        warnings.push(
            "mismatch_policy = drop - instances of a new series are lost until the current one completes"
                .to_string(),
        );
    }

    if !grouping.flush_on_shutdown {
        warnings.push("flush_on_shutdown = false - the open series is discarded on shutdown".to_string());
    }

    if blueprint.delivery.sink == SinkType::Log {
        warnings.push("delivery.sink = log - completed series are only logged".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Idle timeout: {} ms", summary.idle_timeout_ms);
            println!("  Tick interval: {} ms", summary.tick_interval_ms);
            println!("  Sink: {} ({})", summary.sink, summary.endpoint);
            println!("  Source: {}", summary.source);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
