//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::ServiceBlueprint;
use serde::Serialize;
use tracing::info;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    grouping: GroupingInfo,
    delivery: DeliveryInfo,
    collector: CollectorInfo,
    source: SourceInfo,
}

#[derive(Serialize)]
struct GroupingInfo {
    idle_timeout_ms: u64,
    tick_interval_ms: u64,
    mismatch_policy: String,
    flush_on_shutdown: bool,
    shutdown_grace_ms: u64,
}

#[derive(Serialize)]
struct DeliveryInfo {
    sink: String,
    endpoint: String,
    request_timeout_ms: u64,
}

#[derive(Serialize)]
struct CollectorInfo {
    bind: String,
    database_url: String,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SourceInfo {
    Replay {
        path: String,
    },
    Mock {
        series_count: u32,
        instances_per_series: u32,
        instance_interval_ms: u64,
        series_gap_ms: u64,
    },
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let blueprint = load_blueprint(args.config.as_deref())?;
    info!("Loaded configuration info");

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn build_config_info(blueprint: &ServiceBlueprint) -> ConfigInfo {
    let grouping = &blueprint.grouping;
    let source = match &blueprint.source.replay_path {
        Some(path) => SourceInfo::Replay {
            path: path.display().to_string(),
        },
        None => {
            let mock = &blueprint.source.mock;
            SourceInfo::Mock {
                series_count: mock.series_count,
                instances_per_series: mock.instances_per_series,
                instance_interval_ms: mock.instance_interval_ms,
                series_gap_ms: mock.series_gap_ms,
            }
        }
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        grouping: GroupingInfo {
            idle_timeout_ms: grouping.idle_timeout_ms,
            tick_interval_ms: grouping.tick_interval_ms,
            mismatch_policy: format!("{:?}", grouping.mismatch_policy),
            flush_on_shutdown: grouping.flush_on_shutdown,
            shutdown_grace_ms: grouping.shutdown_grace_ms,
        },
        delivery: DeliveryInfo {
            sink: format!("{:?}", blueprint.delivery.sink),
            endpoint: blueprint.delivery.endpoint.clone(),
            request_timeout_ms: blueprint.delivery.request_timeout_ms,
        },
        collector: CollectorInfo {
            bind: blueprint.collector.bind.clone(),
            database_url: blueprint.collector.database_url.clone(),
        },
        source,
    }
}

fn print_config_info(blueprint: &ServiceBlueprint) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Series Dispatcher Configuration                ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let grouping = &blueprint.grouping;
    println!("⏱  Grouping");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Idle timeout: {} ms", grouping.idle_timeout_ms);
    println!("   ├─ Tick interval: {} ms", grouping.tick_interval_ms);
    println!("   ├─ Mismatch policy: {:?}", grouping.mismatch_policy);
    println!("   ├─ Flush on shutdown: {}", grouping.flush_on_shutdown);
    println!("   └─ Shutdown grace: {} ms", grouping.shutdown_grace_ms);

    let delivery = &blueprint.delivery;
    println!("\n📮 Delivery");
    println!("   ├─ Sink: {:?}", delivery.sink);
    println!("   ├─ Endpoint: {}", delivery.endpoint);
    println!("   └─ Request timeout: {} ms", delivery.request_timeout_ms);

    println!("\n🗄  Collector");
    println!("   ├─ Bind: {}", blueprint.collector.bind);
    println!("   └─ Database: {}", blueprint.collector.database_url);

    println!("\n📥 Source");
    match &blueprint.source.replay_path {
        Some(path) => println!("   └─ Replay: {}", path.display()),
        None => {
            let mock = &blueprint.source.mock;
            println!("   ├─ Mock modality: {} series", mock.series_count);
            println!("   ├─ Instances per series: {}", mock.instances_per_series);
            println!("   ├─ Instance interval: {} ms", mock.instance_interval_ms);
            println!("   └─ Series gap: {} ms", mock.series_gap_ms);
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_json_tags_source_kind() {
        let mut blueprint = ServiceBlueprint::default();
        let json = serde_json::to_value(build_config_info(&blueprint)).unwrap();
        assert_eq!(json["source"]["kind"], "mock");
        assert_eq!(json["grouping"]["idle_timeout_ms"], 1000);

        blueprint.source.replay_path = Some("session.jsonl".into());
        let json = serde_json::to_value(build_config_info(&blueprint)).unwrap();
        assert_eq!(json["source"]["kind"], "replay");
        assert_eq!(json["source"]["path"], "session.jsonl");
    }
}
