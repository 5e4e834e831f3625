//! SQLite-backed series store

use std::str::FromStr;

use contracts::SeriesPayload;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, instrument};

use crate::error::{CollectorError, Result};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS series (
        SeriesInstanceUID TEXT PRIMARY KEY,
        PatientID TEXT,
        PatientName TEXT,
        StudyInstanceUID TEXT,
        NumInstances INTEGER NOT NULL
    )
"#;

const SELECT_COLUMNS: &str =
    "SELECT SeriesInstanceUID, PatientID, PatientName, StudyInstanceUID, NumInstances FROM series";

/// Series summaries keyed by `SeriesInstanceUID`
#[derive(Debug, Clone)]
pub struct SeriesStore {
    pool: SqlitePool,
}

impl SeriesStore {
    /// Open (creating if missing) the database at `database_url` and ensure the schema
    #[instrument(name = "series_store_connect", skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // An in-memory database lives as long as its connection, so pin exactly one
        let pool = if is_memory_url(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(4)
                .connect_with(options)
                .await?
        };

        let store = Self { pool };
        store.init_schema().await?;

        info!(memory = is_memory_url(database_url), "series store ready");
        Ok(store)
    }

    /// Fresh in-memory store
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert or overwrite the record with the same `SeriesInstanceUID`
    #[instrument(
        name = "series_store_upsert",
        skip(self, payload),
        fields(series_instance_uid = %payload.series_instance_uid)
    )]
    pub async fn upsert(&self, payload: &SeriesPayload) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO series (SeriesInstanceUID, PatientID, PatientName, StudyInstanceUID, NumInstances)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(SeriesInstanceUID) DO UPDATE SET
                PatientID = excluded.PatientID,
                PatientName = excluded.PatientName,
                StudyInstanceUID = excluded.StudyInstanceUID,
                NumInstances = excluded.NumInstances
            "#,
        )
        .bind(&payload.series_instance_uid)
        .bind(&payload.patient_id)
        .bind(&payload.patient_name)
        .bind(&payload.study_instance_uid)
        .bind(i64::from(payload.num_instances))
        .execute(&self.pool)
        .await?;

        debug!(num_instances = payload.num_instances, "series upserted");
        Ok(())
    }

    /// All records, most recently first-inserted first
    pub async fn list(&self) -> Result<Vec<SeriesPayload>> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY rowid DESC"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(payload_from_row).collect()
    }

    pub async fn get(&self, series_instance_uid: &str) -> Result<Option<SeriesPayload>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE SeriesInstanceUID = ?"))
            .bind(series_instance_uid)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(payload_from_row).transpose()
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM series")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn payload_from_row(row: &SqliteRow) -> Result<SeriesPayload> {
    let series_instance_uid: String = row.try_get("SeriesInstanceUID")?;
    let num_instances: i64 = row.try_get("NumInstances")?;
    let num_instances =
        u32::try_from(num_instances).map_err(|e| CollectorError::CorruptRecord {
            series_instance_uid: series_instance_uid.clone(),
            message: e.to_string(),
        })?;

    Ok(SeriesPayload {
        patient_id: row.try_get("PatientID")?,
        patient_name: row.try_get("PatientName")?,
        study_instance_uid: row.try_get("StudyInstanceUID")?,
        series_instance_uid,
        num_instances,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(uid: &str, count: u32) -> SeriesPayload {
        SeriesPayload {
            patient_id: Some("123".into()),
            patient_name: Some("Doe^John".into()),
            study_instance_uid: Some("0.0.0.0".into()),
            series_instance_uid: uid.into(),
            num_instances: count,
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_and_keeps_latest() {
        let store = SeriesStore::in_memory().await.unwrap();

        store.upsert(&payload("1.2.3.4", 3)).await.unwrap();
        store.upsert(&payload("1.2.3.4", 5)).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let stored = store.get("1.2.3.4").await.unwrap().unwrap();
        assert_eq!(stored.num_instances, 5);
        assert_eq!(stored.patient_name.as_deref(), Some("Doe^John"));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = SeriesStore::in_memory().await.unwrap();

        store.upsert(&payload("1", 1)).await.unwrap();
        store.upsert(&payload("2", 1)).await.unwrap();
        store.upsert(&payload("3", 1)).await.unwrap();

        let uids: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.series_instance_uid)
            .collect();
        assert_eq!(uids, vec!["3", "2", "1"]);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = SeriesStore::in_memory().await.unwrap();
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_null_descriptive_fields_round_trip() {
        let store = SeriesStore::in_memory().await.unwrap();
        let minimal = SeriesPayload {
            patient_id: None,
            patient_name: None,
            study_instance_uid: None,
            series_instance_uid: "9.9.9.9".into(),
            num_instances: 1,
        };

        store.upsert(&minimal).await.unwrap();
        assert_eq!(store.get("9.9.9.9").await.unwrap(), Some(minimal));
    }
}
