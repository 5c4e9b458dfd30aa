//! HTTP server startup and graceful shutdown

use crate::routes::create_router;
use crate::state::AppState;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Bind to the configured address and serve until Ctrl-C
///
/// # Errors
/// Returns an IO error if the address cannot be bound or the server fails
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let address = state.config.bind_address();
    let app = create_router(state);

    let listener = TcpListener::bind(&address).await?;
    info!(address = %listener.local_addr()?, "Tokenlens API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Tokenlens API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for the shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
