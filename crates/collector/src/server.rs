//! Collector server lifecycle

use std::future::Future;
use std::net::SocketAddr;

use contracts::CollectorConfig;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::routes::router;
use crate::store::SeriesStore;

/// Serve the collector until `shutdown` resolves
#[instrument(name = "collector_serve", skip(config, shutdown), fields(bind = %config.bind))]
pub async fn serve<F>(config: &CollectorConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let store = SeriesStore::connect(&config.database_url).await?;
    let listener = TcpListener::bind(&config.bind).await?;
    info!(addr = %listener.local_addr()?, "collector listening");

    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("collector stopped");
    Ok(())
}

/// Serve `store` in a background task
///
/// Binding `127.0.0.1:0` picks a free port; the bound address is returned.
pub async fn spawn(store: SeriesStore, bind: &str) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(bind).await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router(store)).await {
            error!(error = %e, "collector server failed");
        }
    });

    info!(addr = %addr, "collector spawned");
    Ok((addr, handle))
}
