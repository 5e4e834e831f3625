//! Recording replay
//!
//! A recording is a JSON-lines file, one instance per line, each optionally
//! preceded by `delay_ms` of silence:
//!
//! ```text
//! {"delay_ms": 0, "series_instance_uid": "1.2.3.4", "patient_id": "123"}
//! {"delay_ms": 50, "series_instance_uid": "1.2.3.4"}
//! # comments and blank lines are skipped
//! ```

use std::path::Path;
use std::time::Duration;

use contracts::Instance;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::error::{IngestionError, Result};
use crate::queue::InstanceFeed;

/// One line of a recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayRecord {
    /// Silence before this instance
    #[serde(default)]
    pub delay_ms: u64,

    #[serde(flatten)]
    pub instance: Instance,
}

/// Parse recording content
pub fn parse_recording(content: &str) -> Result<Vec<ReplayRecord>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| IngestionError::ReplayParse {
                line: idx + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Load a recording from disk
#[instrument(name = "replay_load", fields(path = %path.display()))]
pub fn load_recording(path: &Path) -> Result<Vec<ReplayRecord>> {
    let content = std::fs::read_to_string(path)?;
    let records = parse_recording(&content)?;
    debug!(records = records.len(), "recording loaded");
    Ok(records)
}

/// Push the records into the feed honoring their delays
///
/// The feed is closed at the end. The task resolves to the number of instances sent.
pub fn spawn_replay(records: Vec<ReplayRecord>, feed: InstanceFeed) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let total = records.len();
        let mut sent = 0usize;
        info!(records = total, "replay started");

        for record in records {
            if record.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(record.delay_ms)).await;
            }
            if feed.push(record.instance).is_err() {
                break;
            }
            sent += 1;
        }

        feed.close();
        info!(sent, total, "replay finished");
        sent
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::instance_queue;
    use contracts::InstanceSource;
    use std::io::Write;

    const RECORDING: &str = r#"
# first series
{"series_instance_uid": "1.2.3.4", "patient_id": "123", "patient_name": "Doe^John"}
{"delay_ms": 5, "series_instance_uid": "1.2.3.4"}

{"delay_ms": 5, "series_instance_uid": "1.2.3.4"}
"#;

    #[test]
    fn test_parse_recording_skips_comments_and_blanks() {
        let records = parse_recording(RECORDING).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].delay_ms, 0);
        assert_eq!(records[0].instance.patient_id.as_deref(), Some("123"));
        assert_eq!(records[1].delay_ms, 5);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = parse_recording("{\"series_instance_uid\": \"1\"}\nnot json").unwrap_err();
        assert!(matches!(err, IngestionError::ReplayParse { line: 2, .. }));
    }

    #[test]
    fn test_load_recording_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RECORDING.as_bytes()).unwrap();

        let records = load_recording(file.path()).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn test_spawn_replay_pushes_in_order_and_closes() {
        let (feed, mut queue) = instance_queue("replay");
        let records = parse_recording(RECORDING).unwrap();

        let sent = spawn_replay(records, feed).await.unwrap();
        assert_eq!(sent, 3);
        assert!(queue.is_closed());

        let drained: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0].patient_name.as_deref(), Some("Doe^John"));
    }
}
