//! Gateway server assembly.

use std::sync::Arc;

use axum::routing::any;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::proxy::{serve_site, ProxyState};

/// Build the site-serving router.
///
/// Everything is a site request — there are no reserved paths, since any
/// path may exist inside a deployed site.
pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new().fallback(any(serve_site)).with_state(state)
}

/// Run the gateway until the token is cancelled.
pub async fn run(config: GatewayConfig, cancel: CancellationToken) -> Result<(), GatewayError> {
    let state = Arc::new(ProxyState::new(&config.upstream)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.server.bind_address).await?;
    info!(
        address = %config.server.bind_address,
        upstream = %config.upstream.base,
        "gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    info!("gateway shutdown complete");
    Ok(())
}
