//! In-process instance queue
//!
//! Producers push through an `InstanceFeed`; the grouping scheduler drains the
//! `InstanceQueue` through the non-blocking `InstanceSource` contract.

use std::sync::Arc;

use async_channel::{unbounded, Receiver, Sender, TryRecvError, TrySendError};
use contracts::{Instance, InstanceSource};
use tracing::{debug, trace, warn};

use crate::config::IngestionMetrics;
use crate::error::{IngestionError, Result};

/// Create a connected feed/queue pair
///
/// The queue is unbounded: the consumer must drain eagerly, producers never wait.
pub fn instance_queue(name: impl Into<String>) -> (InstanceFeed, InstanceQueue) {
    let name = name.into();
    let (tx, rx) = unbounded();
    let metrics = Arc::new(IngestionMetrics::new());

    let feed = InstanceFeed {
        name: name.clone(),
        tx,
        metrics: Arc::clone(&metrics),
    };
    let queue = InstanceQueue { name, rx, metrics };

    (feed, queue)
}

/// Producer side of the queue
///
/// Cloneable and usable from any thread or task. The queue reports itself closed
/// once every feed is dropped or `close` is called.
#[derive(Debug, Clone)]
pub struct InstanceFeed {
    name: String,
    tx: Sender<Instance>,
    metrics: Arc<IngestionMetrics>,
}

impl InstanceFeed {
    /// Append an instance at the tail of the queue
    pub fn push(&self, instance: Instance) -> Result<()> {
        match self.tx.try_send(instance) {
            Ok(()) => {
                self.metrics.record_received();
                self.metrics.update_queue_len(self.tx.len());
                trace!(queue = %self.name, len = self.tx.len(), "instance queued");
                Ok(())
            }
            Err(TrySendError::Closed(instance)) | Err(TrySendError::Full(instance)) => {
                self.metrics.record_push_error();
                warn!(
                    queue = %self.name,
                    series_instance_uid = %instance.series_instance_uid,
                    "queue closed, instance dropped"
                );
                Err(IngestionError::ChannelClosed {
                    source_name: self.name.clone(),
                })
            }
        }
    }

    /// Close the queue for every producer
    ///
    /// Instances already queued can still be drained.
    pub fn close(&self) -> bool {
        let closed = self.tx.close();
        if closed {
            debug!(queue = %self.name, "instance queue closed");
        }
        closed
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        Arc::clone(&self.metrics)
    }
}

/// Consumer side of the queue
#[derive(Debug)]
pub struct InstanceQueue {
    name: String,
    rx: Receiver<Instance>,
    metrics: Arc<IngestionMetrics>,
}

impl InstanceQueue {
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        Arc::clone(&self.metrics)
    }
}

impl InstanceSource for InstanceQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_pending(&self) -> bool {
        !self.rx.is_empty()
    }

    fn pop(&mut self) -> Option<Instance> {
        match self.rx.try_recv() {
            Ok(instance) => {
                self.metrics.record_drained();
                self.metrics.update_queue_len(self.rx.len());
                Some(instance)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => None,
        }
    }

    fn is_closed(&self) -> bool {
        self.rx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let (feed, mut queue) = instance_queue("test");

        feed.push(Instance::new("1.2.3.4").with_sop("a")).unwrap();
        feed.push(Instance::new("1.2.3.4").with_sop("b")).unwrap();
        feed.push(Instance::new("1.2.3.4").with_sop("c")).unwrap();

        assert!(queue.has_pending());
        let order: Vec<_> = std::iter::from_fn(|| queue.pop())
            .map(|i| i.sop_instance_uid.unwrap())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert!(!queue.has_pending());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_close_keeps_queued_instances() {
        let (feed, mut queue) = instance_queue("test");
        feed.push(Instance::new("1.2.3.4")).unwrap();

        assert!(feed.close());
        assert!(queue.is_closed());
        assert!(feed.push(Instance::new("1.2.3.4")).is_err());

        assert!(queue.pop().is_some());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_dropping_all_feeds_closes_queue() {
        let (feed, queue) = instance_queue("test");
        let second = feed.clone();

        drop(feed);
        assert!(!queue.is_closed());
        drop(second);
        assert!(queue.is_closed());
    }

    #[test]
    fn test_metrics_track_push_and_drain() {
        let (feed, mut queue) = instance_queue("test");
        feed.push(Instance::new("1")).unwrap();
        feed.push(Instance::new("1")).unwrap();
        queue.pop();

        let snapshot = queue.metrics().snapshot();
        assert_eq!(snapshot.instances_received, 2);
        assert_eq!(snapshot.instances_drained, 1);
        assert_eq!(snapshot.queue_len, 1);
    }
}
