//! Control plane server assembly.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{self, AppState};
use crate::config::ControlConfig;
use crate::dispatch::HttpExecutor;
use crate::error::ControlResult;
use crate::relay::{bus, Rooms};

/// Run the control plane until the token is cancelled.
pub async fn run(config: ControlConfig, cancel: CancellationToken) -> ControlResult<()> {
    let executor = Arc::new(HttpExecutor::new(&config.executor)?);
    let rooms = Arc::new(Rooms::new());

    let bus_task = tokio::spawn(bus::run(
        config.bus.clone(),
        Arc::clone(&rooms),
        cancel.clone(),
    ));

    let state = Arc::new(AppState {
        executor,
        rooms,
        preview: config.preview.clone(),
    });

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(config.server.bind_address).await?;
    info!(address = %config.server.bind_address, "control plane listening");

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    // The bus task watches the same token; wait for it to wind down.
    let _ = bus_task.await;

    info!("control plane shutdown complete");
    Ok(())
}
