//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 端到端测试：队列 -> 分组调度器 -> HTTP sink -> collector（内存 SQLite）

#[cfg(test)]
mod contract_tests {
    use contracts::{Instance, SeriesPayload};

    #[test]
    fn test_payload_wire_names() {
        let payload = SeriesPayload {
            patient_id: Some("123".into()),
            patient_name: Some("Doe^John".into()),
            study_instance_uid: Some("0.0.0.0".into()),
            series_instance_uid: "1.2.3.4".into(),
            num_instances: 3,
        };

        let json = serde_json::to_value(&payload).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "NumInstances",
                "PatientID",
                "PatientName",
                "SeriesInstanceUID",
                "StudyInstanceUID"
            ]
        );
    }

    #[test]
    fn test_instance_json_only_requires_series_uid() {
        let instance: Instance =
            serde_json::from_str(r#"{"series_instance_uid": "1.2.3.4"}"#).unwrap();
        assert_eq!(instance, Instance::new("1.2.3.4"));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use collector::SeriesStore;
    use contracts::{GroupingConfig, Instance, MismatchPolicy, MockModalityConfig};
    use dispatcher::HttpSink;
    use grouping::{GroupingScheduler, StopReason};
    use ingestion::{instance_queue, series_uid_for, InstanceFeed, InstanceQueue, MockModality};

    fn fast_grouping(mismatch_policy: MismatchPolicy) -> GroupingConfig {
        GroupingConfig {
            idle_timeout_ms: 50,
            tick_interval_ms: 10,
            mismatch_policy,
            flush_on_shutdown: true,
            shutdown_grace_ms: 2000,
        }
    }

    /// Collector on a free port backed by an in-memory database
    async fn start_collector() -> (String, SeriesStore) {
        let store = SeriesStore::in_memory().await.unwrap();
        let (addr, _handle) = collector::spawn(store.clone(), "127.0.0.1:0")
            .await
            .unwrap();
        (format!("http://{addr}/series"), store)
    }

    fn scheduler_for(
        endpoint: &str,
        grouping: GroupingConfig,
        queue: InstanceQueue,
    ) -> GroupingScheduler<InstanceQueue, HttpSink> {
        let sink = HttpSink::new("collector", endpoint, Duration::from_secs(2)).unwrap();
        GroupingScheduler::new(grouping, queue, sink)
    }

    fn instance(series_uid: &str) -> Instance {
        Instance::new(series_uid)
            .with_patient("123", "Doe^John")
            .with_study("0.0.0.0")
    }

    fn push_all(feed: &InstanceFeed, series_uid: &str, count: usize) {
        for _ in 0..count {
            feed.push(instance(series_uid)).unwrap();
        }
    }

    /// End-to-end: three instances of one series become one stored record
    #[tokio::test]
    async fn test_e2e_single_series_reaches_collector() {
        let (endpoint, store) = start_collector().await;
        let (feed, queue) = instance_queue("e2e");
        let mut scheduler = scheduler_for(&endpoint, fast_grouping(MismatchPolicy::Drop), queue);

        push_all(&feed, "1.2.3.4", 3);
        feed.close();

        let reason = tokio::time::timeout(Duration::from_secs(5), scheduler.run())
            .await
            .unwrap();
        assert_eq!(reason, StopReason::SourceClosed);

        let stored = store.get("1.2.3.4").await.unwrap().unwrap();
        assert_eq!(stored.num_instances, 3);
        assert_eq!(stored.patient_id.as_deref(), Some("123"));
        assert_eq!(stored.patient_name.as_deref(), Some("Doe^John"));
        assert_eq!(stored.study_instance_uid.as_deref(), Some("0.0.0.0"));

        let metrics = scheduler.dispatch_metrics();
        assert_eq!(metrics.started_count, 1);
        assert_eq!(metrics.delivered_count, 1);
    }

    /// The collector GET endpoint serves what the pipeline delivered
    #[tokio::test]
    async fn test_e2e_series_visible_over_http() {
        let (endpoint, _store) = start_collector().await;
        let (feed, queue) = instance_queue("e2e");
        let mut scheduler = scheduler_for(&endpoint, fast_grouping(MismatchPolicy::Drop), queue);

        push_all(&feed, "9.8.7", 2);
        feed.close();
        tokio::time::timeout(Duration::from_secs(5), scheduler.run())
            .await
            .unwrap();

        let record: serde_json::Value = reqwest::get(format!("{endpoint}/9.8.7"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(record["SeriesInstanceUID"], "9.8.7");
        assert_eq!(record["NumInstances"], 2);
    }

    /// Series separated by silence are grouped independently, listed newest first
    #[tokio::test]
    async fn test_e2e_mock_modality_series_in_order() {
        let (endpoint, store) = start_collector().await;
        let (feed, queue) = instance_queue("mock-modality");
        let mut scheduler = scheduler_for(&endpoint, fast_grouping(MismatchPolicy::Drop), queue);

        let modality = MockModality::new(MockModalityConfig {
            series_count: 3,
            instances_per_series: 4,
            instance_interval_ms: 2,
            series_gap_ms: 150,
            ..Default::default()
        });
        let producer = modality.start(feed);

        let reason = tokio::time::timeout(Duration::from_secs(10), scheduler.run())
            .await
            .unwrap();
        assert_eq!(reason, StopReason::SourceClosed);
        assert_eq!(producer.await.unwrap(), 12);

        let listed = store.list().await.unwrap();
        let uids: Vec<_> = listed.iter().map(|p| p.series_instance_uid.clone()).collect();
        assert_eq!(
            uids,
            vec![series_uid_for(2), series_uid_for(1), series_uid_for(0)]
        );
        assert!(listed.iter().all(|p| p.num_instances == 4));
        assert_eq!(scheduler.counters().rejected, 0);
    }

    /// With the drop policy a different series arriving mid-series is lost
    #[tokio::test]
    async fn test_e2e_mismatch_dropped() {
        let (endpoint, store) = start_collector().await;
        let (feed, queue) = instance_queue("e2e");
        let mut scheduler = scheduler_for(&endpoint, fast_grouping(MismatchPolicy::Drop), queue);

        push_all(&feed, "A", 2);
        push_all(&feed, "B", 1);
        feed.close();
        tokio::time::timeout(Duration::from_secs(5), scheduler.run())
            .await
            .unwrap();

        assert_eq!(store.get("A").await.unwrap().unwrap().num_instances, 2);
        assert!(store.get("B").await.unwrap().is_none());
        assert_eq!(scheduler.counters().rejected, 1);
    }

    /// With the rotate policy the open series is handed off and the newcomer starts a new one
    #[tokio::test]
    async fn test_e2e_mismatch_rotates() {
        let (endpoint, store) = start_collector().await;
        let (feed, queue) = instance_queue("e2e");
        let mut scheduler =
            scheduler_for(&endpoint, fast_grouping(MismatchPolicy::Rotate), queue);

        push_all(&feed, "A", 2);
        push_all(&feed, "B", 3);
        feed.close();
        tokio::time::timeout(Duration::from_secs(5), scheduler.run())
            .await
            .unwrap();

        assert_eq!(store.get("A").await.unwrap().unwrap().num_instances, 2);
        assert_eq!(store.get("B").await.unwrap().unwrap().num_instances, 3);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    /// A straggler after dispatch opens a new buffer; the upsert keeps one record
    #[tokio::test]
    async fn test_e2e_late_instance_overwrites_by_uid() {
        let (endpoint, store) = start_collector().await;
        let (feed, queue) = instance_queue("e2e");
        let mut scheduler = scheduler_for(&endpoint, fast_grouping(MismatchPolicy::Drop), queue);

        let producer = async move {
            push_all(&feed, "1.2.3.4", 3);
            tokio::time::sleep(Duration::from_millis(300)).await;
            push_all(&feed, "1.2.3.4", 1);
            feed.close();
        };

        let (reason, ()) = tokio::time::timeout(
            Duration::from_secs(5),
            async { tokio::join!(scheduler.run(), producer) },
        )
        .await
        .unwrap();
        assert_eq!(reason, StopReason::SourceClosed);

        assert_eq!(scheduler.dispatch_metrics().delivered_count, 2);
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.get("1.2.3.4").await.unwrap().unwrap().num_instances, 1);
    }

    /// An unreachable collector fails the delivery without stopping the loop
    #[tokio::test]
    async fn test_e2e_unreachable_collector_counts_failure() {
        // bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (feed, queue) = instance_queue("e2e");
        let mut scheduler = scheduler_for(
            &format!("http://{addr}/series"),
            fast_grouping(MismatchPolicy::Drop),
            queue,
        );

        push_all(&feed, "A", 2);
        feed.close();
        let reason = tokio::time::timeout(Duration::from_secs(5), scheduler.run())
            .await
            .unwrap();
        assert_eq!(reason, StopReason::SourceClosed);

        let metrics = scheduler.dispatch_metrics();
        assert_eq!(metrics.failure_count, 1);
        assert_eq!(metrics.delivered_count, 0);
        assert_eq!(scheduler.stats().summary().total_failed, 1);
    }

    /// Shutdown flushes the open series to the collector before returning
    #[tokio::test]
    async fn test_e2e_shutdown_flushes_open_series() {
        let (endpoint, store) = start_collector().await;
        let (feed, queue) = instance_queue("e2e");
        let mut grouping = fast_grouping(MismatchPolicy::Drop);
        grouping.idle_timeout_ms = 60_000;
        let mut scheduler = scheduler_for(&endpoint, grouping, queue);

        push_all(&feed, "open", 5);
        let reason = scheduler
            .run_until(tokio::time::sleep(Duration::from_millis(50)))
            .await;
        assert_eq!(reason, StopReason::Shutdown);

        assert_eq!(store.get("open").await.unwrap().unwrap().num_instances, 5);
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use dispatcher::{create_sink, ConfiguredSink};

    /// A loaded configuration produces the sink the pipeline runs with
    #[test]
    fn test_config_drives_sink_creation() {
        let content = r#"
[grouping]
idle_timeout_ms = 750

[delivery]
sink = "http"
endpoint = "http://127.0.0.1:8000/series"
"#;
        let blueprint = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        assert_eq!(blueprint.grouping.idle_timeout_ms, 750);

        let sink = create_sink(&blueprint.delivery).unwrap();
        assert!(matches!(sink, ConfiguredSink::Http(_)));
    }
}
