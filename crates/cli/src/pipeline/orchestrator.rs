//! Pipeline orchestrator - wires source, grouping scheduler and sink.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use collector::SeriesStore;
use contracts::{ServiceBlueprint, SinkType};
use grouping::GroupingScheduler;
use ingestion::{instance_queue, replay, InstanceFeed, MockModality};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::PipelineStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The service blueprint, CLI overrides applied
    pub blueprint: ServiceBlueprint,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Serve the collector in-process and deliver to it
    pub with_collector: bool,
}

/// Running instance producer
enum Producer {
    Mock {
        modality: MockModality,
        handle: JoinHandle<u64>,
    },
    Replay(JoinHandle<usize>),
}

impl Producer {
    fn stop(self) {
        match self {
            Self::Mock { modality, handle } => {
                modality.stop();
                handle.abort();
            }
            Self::Replay(handle) => handle.abort(),
        }
    }
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the source is exhausted, the timeout elapses or `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let PipelineConfig {
            mut blueprint,
            timeout,
            metrics_port,
            with_collector,
        } = self.config;

        if let Some(port) = metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let collector = if with_collector {
            let store = SeriesStore::connect(&blueprint.collector.database_url)
                .await
                .context("Failed to open collector database")?;
            let (addr, handle) = collector::spawn(store, &blueprint.collector.bind)
                .await
                .with_context(|| format!("Failed to bind collector on {}", blueprint.collector.bind))?;

            blueprint.delivery.sink = SinkType::Http;
            blueprint.delivery.endpoint = format!("http://{addr}/series");
            info!(endpoint = %blueprint.delivery.endpoint, "In-process collector started");
            Some(handle)
        } else {
            None
        };

        let sink = dispatcher::create_sink(&blueprint.delivery).context("Failed to create sink")?;

        let source_name = if blueprint.source.replay_path.is_some() {
            "replay"
        } else {
            "mock-modality"
        };
        let (feed, queue) = instance_queue(source_name);
        let producer = start_producer(&blueprint, feed)?;

        let mut scheduler = GroupingScheduler::new(blueprint.grouping.clone(), queue, sink);

        let deadline = async move {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };

        info!(source = source_name, sink = ?blueprint.delivery.sink, "Starting pipeline...");
        let stop_reason = scheduler
            .run_until(async {
                tokio::select! {
                    _ = shutdown => warn!("Received shutdown signal, stopping pipeline..."),
                    _ = deadline => info!("Pipeline timeout reached"),
                }
            })
            .await;

        producer.stop();

        let stats = PipelineStats {
            stop_reason,
            instances_received: scheduler.source().metrics().snapshot().instances_received,
            counters: scheduler.counters(),
            dispatch: scheduler.dispatch_metrics(),
            duration: start_time.elapsed(),
            report: scheduler.stats().summary(),
        };

        if let Some(handle) = collector {
            handle.abort();
        }

        if stats.dispatch.failure_count > 0 && stats.dispatch.delivered_count == 0 {
            return Err(CliError::pipeline_execution(format!(
                "all {} deliveries failed",
                stats.dispatch.failure_count
            ))
            .into());
        }

        Ok(stats)
    }
}

fn start_producer(blueprint: &ServiceBlueprint, feed: InstanceFeed) -> Result<Producer> {
    match &blueprint.source.replay_path {
        Some(path) => {
            let records = replay::load_recording(path)
                .with_context(|| format!("Failed to load recording {}", path.display()))?;
            info!(path = %path.display(), records = records.len(), "Replaying recording");
            Ok(Producer::Replay(replay::spawn_replay(records, feed)))
        }
        None => {
            let modality = MockModality::new(blueprint.source.mock.clone());
            let handle = modality.start(feed);
            Ok(Producer::Mock { modality, handle })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::MockModalityConfig;

    fn fast_blueprint() -> ServiceBlueprint {
        let mut blueprint = ServiceBlueprint::default();
        blueprint.grouping.idle_timeout_ms = 30;
        blueprint.grouping.tick_interval_ms = 5;
        blueprint.delivery.sink = SinkType::Log;
        blueprint.source.mock = MockModalityConfig {
            series_count: 2,
            instances_per_series: 3,
            instance_interval_ms: 1,
            series_gap_ms: 80,
            ..Default::default()
        };
        blueprint
    }

    #[tokio::test]
    async fn test_mock_pipeline_runs_to_completion() {
        let pipeline = Pipeline::new(PipelineConfig {
            blueprint: fast_blueprint(),
            timeout: Some(Duration::from_secs(10)),
            metrics_port: None,
            with_collector: false,
        });

        let stats = pipeline.run(std::future::pending::<()>()).await.unwrap();

        assert_eq!(stats.stop_reason, grouping::StopReason::SourceClosed);
        assert_eq!(stats.instances_received, 6);
        assert_eq!(stats.counters.series_opened, 2);
        assert_eq!(stats.dispatch.delivered_count, 2);
        assert_eq!(stats.report.total_dispatched, 2);
    }

    #[tokio::test]
    async fn test_pipeline_with_in_process_collector() {
        let mut blueprint = fast_blueprint();
        blueprint.collector.bind = "127.0.0.1:0".to_string();
        blueprint.collector.database_url = "sqlite::memory:".to_string();

        let pipeline = Pipeline::new(PipelineConfig {
            blueprint,
            timeout: Some(Duration::from_secs(10)),
            metrics_port: None,
            with_collector: true,
        });

        let stats = pipeline.run(std::future::pending::<()>()).await.unwrap();
        assert_eq!(stats.dispatch.delivered_count, 2);
        assert_eq!(stats.dispatch.failure_count, 0);
    }

    #[tokio::test]
    async fn test_shutdown_signal_stops_pipeline() {
        let mut blueprint = fast_blueprint();
        blueprint.source.mock.series_gap_ms = 60_000;

        let pipeline = Pipeline::new(PipelineConfig {
            blueprint,
            timeout: None,
            metrics_port: None,
            with_collector: false,
        });

        let stats = pipeline
            .run(tokio::time::sleep(Duration::from_millis(100)))
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, grouping::StopReason::Shutdown);
        // first series went idle before the signal, nothing else was open
        assert_eq!(stats.dispatch.delivered_count, 1);
    }
}
