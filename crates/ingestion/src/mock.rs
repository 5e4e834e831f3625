//! Simulated modality
//!
//! Sends series the way a device does: instances in quick succession, no
//! end-of-series marker, then silence before the next series.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{Instance, MockModalityConfig};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::queue::InstanceFeed;

/// Series identifier used for the `index`-th simulated series
pub fn series_uid_for(index: u32) -> String {
    format!("1.2.826.0.1.3680043.8.498.{}", index + 1)
}

/// Simulated modality
pub struct MockModality {
    config: MockModalityConfig,
    running: Arc<AtomicBool>,
}

impl MockModality {
    pub fn new(config: MockModalityConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start sending in a background task
    ///
    /// The feed is closed once every series has been sent. The task resolves to the
    /// number of instances sent.
    pub fn start(&self, feed: InstanceFeed) -> JoinHandle<u64> {
        let config = self.config.clone();
        let running = Arc::clone(&self.running);

        running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            let instance_interval = Duration::from_millis(config.instance_interval_ms);
            let series_gap = Duration::from_millis(config.series_gap_ms);
            let mut sent: u64 = 0;

            info!(
                series = config.series_count,
                instances_per_series = config.instances_per_series,
                "mock modality started"
            );

            'series: for series_index in 0..config.series_count {
                let series_uid = series_uid_for(series_index);
                let study_uid = format!("{}.0", series_uid);

                for instance_index in 0..config.instances_per_series {
                    if !running.load(Ordering::Relaxed) {
                        break 'series;
                    }

                    let instance = Instance::new(series_uid.clone())
                        .with_sop(format!("{}.{}", series_uid, instance_index + 1))
                        .with_patient(config.patient_id.clone(), config.patient_name.clone())
                        .with_study(study_uid.clone());

                    if feed.push(instance).is_err() {
                        debug!("mock modality queue closed");
                        break 'series;
                    }
                    sent += 1;

                    trace!(series_uid = %series_uid, instance_index, "mock instance sent");
                    tokio::time::sleep(instance_interval).await;
                }

                debug!(series_uid = %series_uid, "mock series sent");

                if series_index + 1 < config.series_count {
                    tokio::time::sleep(series_gap).await;
                }
            }

            running.store(false, Ordering::SeqCst);
            feed.close();
            info!(sent, "mock modality finished");
            sent
        })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::instance_queue;
    use contracts::InstanceSource;

    fn fast_config(series_count: u32, instances_per_series: u32) -> MockModalityConfig {
        MockModalityConfig {
            series_count,
            instances_per_series,
            instance_interval_ms: 1,
            series_gap_ms: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_mock_modality_sends_all_series() {
        let (feed, mut queue) = instance_queue("mock");
        let modality = MockModality::new(fast_config(2, 3));

        let sent = modality.start(feed).await.unwrap();
        assert_eq!(sent, 6);
        assert!(queue.is_closed());

        let instances: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(instances.len(), 6);
        assert!(instances[..3]
            .iter()
            .all(|i| i.series_instance_uid == series_uid_for(0)));
        assert!(instances[3..]
            .iter()
            .all(|i| i.series_instance_uid == series_uid_for(1)));
        assert_eq!(instances[0].patient_name.as_deref(), Some("Doe^John"));
    }

    #[tokio::test]
    async fn test_mock_modality_stop() {
        let (feed, _queue) = instance_queue("mock");
        let modality = MockModality::new(MockModalityConfig {
            instance_interval_ms: 50,
            ..fast_config(1, 1000)
        });

        let handle = modality.start(feed);
        tokio::time::sleep(Duration::from_millis(20)).await;
        modality.stop();

        let sent = handle.await.unwrap();
        assert!(sent < 1000);
        assert!(!modality.is_running());
    }
}
