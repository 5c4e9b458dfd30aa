//! Catalog error types

use tokenlens_common::CommonError;
use thiserror::Error;

/// Errors raised while loading or querying model limit tables
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Unsupported provider '{provider}'")]
    UnsupportedProvider { provider: String },

    #[error("Model '{model}' not found for provider '{provider}'")]
    ModelNotFound { provider: String, model: String },

    /// A table failed to parse or declares limits that cannot be checked
    #[error("Invalid limit table '{origin}': {message}")]
    InvalidTable { origin: String, message: String },

    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Catalog error: {0}")]
    Other(String),
}

impl CatalogError {
    pub fn unsupported_provider(provider: impl Into<String>) -> Self {
        Self::UnsupportedProvider {
            provider: provider.into(),
        }
    }

    pub fn model_not_found(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self::ModelNotFound {
            provider: provider.into(),
            model: model.into(),
        }
    }

    pub fn invalid_table(origin: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidTable {
            origin: origin.into(),
            message: message.to_string(),
        }
    }

    /// Whether the error means "nothing by that name" rather than a broken catalog
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedProvider { .. } | Self::ModelNotFound { .. }
        )
    }
}

impl CommonError for CatalogError {
    fn io_error(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    fn config_error(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    fn parse_error(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    fn other_error(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

tokenlens_common::impl_common_conversions!(CatalogError, with_serde);

pub type CatalogResult<T> = Result<T, CatalogError>;
