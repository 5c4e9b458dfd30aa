//! Application state for axum handlers

use std::sync::Arc;

use tokenlens_config::{ApiConfig, ApplicationConfig};
use tokenlens_limits::{LimitChecker, LimitResult};

/// Shared across handlers; the checker is built once at startup
#[derive(Clone)]
pub struct AppState {
    pub checker: Arc<LimitChecker>,
    pub config: ApiConfig,
}

impl AppState {
    pub const fn new(checker: Arc<LimitChecker>, config: ApiConfig) -> Self {
        Self { checker, config }
    }

    /// Build the checker from the full application configuration
    ///
    /// # Errors
    /// Returns the checker's error if the catalog or its overrides fail to load
    pub fn from_config(config: &ApplicationConfig) -> LimitResult<Self> {
        let checker = LimitChecker::from_config(config)?;
        Ok(Self::new(Arc::new(checker), config.api.clone()))
    }
}
