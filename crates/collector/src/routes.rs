//! HTTP routes

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use contracts::SeriesPayload;
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::error::{CollectorError, Result};
use crate::store::SeriesStore;

/// Build the collector router over `store`
pub fn router(store: SeriesStore) -> Router {
    Router::new()
        .route("/series", get(list_series).post(receive_series))
        .route("/series/{series_uid}", get(get_series))
        .route("/health", get(health))
        .with_state(store)
}

#[instrument(name = "collector_receive_series", skip_all)]
async fn receive_series(
    State(store): State<SeriesStore>,
    Json(payload): Json<SeriesPayload>,
) -> Result<Json<Value>> {
    if payload.series_instance_uid.trim().is_empty() {
        return Err(CollectorError::Validation(
            "SeriesInstanceUID must not be empty".to_string(),
        ));
    }

    store.upsert(&payload).await?;
    info!(
        series_instance_uid = %payload.series_instance_uid,
        num_instances = payload.num_instances,
        "Received series"
    );
    Ok(Json(json!({ "status": "ok" })))
}

async fn list_series(State(store): State<SeriesStore>) -> Result<Json<Vec<SeriesPayload>>> {
    Ok(Json(store.list().await?))
}

async fn get_series(
    State(store): State<SeriesStore>,
    Path(series_uid): Path<String>,
) -> Result<Json<SeriesPayload>> {
    store
        .get(&series_uid)
        .await?
        .map(Json)
        .ok_or(CollectorError::NotFound)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
