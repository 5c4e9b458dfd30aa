//! Tokenlens API Server
//!
//! HTTP API for token counting, limit checks and batch planning.

use tokenlens_api::{AppState, serve};
use tokenlens_config::{ApplicationConfig, Validate};
use tracing::info;
use tracing_subscriber::EnvFilter;

type MainResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> MainResult {
    tokenlens_common::initialize_environment();

    let config = ApplicationConfig::from_env();
    config.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.tracing_level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.telemetry.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(
        service = %config.telemetry.service_name,
        address = %config.api.bind_address(),
        "Starting Tokenlens API server"
    );

    let state = AppState::from_config(&config)?;
    info!(
        providers = state.checker.catalog().len(),
        "Model catalog loaded"
    );

    serve(state).await?;
    Ok(())
}
