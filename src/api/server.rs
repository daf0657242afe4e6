//! HTTP server startup.

use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::error::{BackendError, Result};
use crate::store::SupabaseClient;
use crate::utils::shutdown_signal;

use super::{create_router, AppState};

/// Build the database client from `config` and serve until shutdown.
pub async fn serve(config: &Config) -> Result<()> {
    config.validate().map_err(BackendError::InvalidConfig)?;
    let addr = config.socket_addr().map_err(BackendError::InvalidConfig)?;

    let store = SupabaseClient::new(config)?;
    info!(rest_url = %store.rest_url(), "Database client ready");

    let router = create_router(AppState::from_store(store));

    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}
