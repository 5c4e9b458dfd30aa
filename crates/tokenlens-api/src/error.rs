//! Structured API errors
//!
//! Every variant carries the request's correlation id, which is echoed in the
//! `X-Correlation-ID` header and the JSON body. Internal failures are logged in
//! full and reach the caller only as a sanitized message with a reference id.
//!
//! ```rust
//! use tokenlens_api::{ApiError, ApiResult};
//! use tokenlens_common::CorrelationId;
//!
//! fn reject() -> ApiResult<()> {
//!     Err(ApiError::validation(
//!         "provider must not be empty",
//!         Some("provider"),
//!         CorrelationId::new(),
//!     ))
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tokenlens_catalog::CatalogError;
use tokenlens_common::CorrelationId;
use tokenlens_common::error_sanitizer::{sanitize_error, sanitize_with_message};
use tokenlens_limits::{LimitError, PlanError};
use tokenlens_tokenizers::TokenizerError;
use tracing::{error, warn};

use crate::middleware::CORRELATION_ID_HEADER;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed body, bad field value or an invalid batch size
    #[error("Request validation failed: {message} (correlation: {correlation_id})")]
    ValidationError {
        message: String,
        field: Option<String>,
        correlation_id: CorrelationId,
    },

    /// The declared content type does not match the model
    #[error("{message} (correlation: {correlation_id})")]
    UnsupportedContentType {
        message: String,
        correlation_id: CorrelationId,
    },

    /// Unknown provider or model
    #[error("{message} (correlation: {correlation_id})")]
    ResourceNotFound {
        message: String,
        correlation_id: CorrelationId,
    },

    /// The requested tokenizer tier cannot be served for this model
    #[error("{message} (correlation: {correlation_id})")]
    TokenizerUnavailable {
        message: String,
        correlation_id: CorrelationId,
    },

    /// Encoding, decoding or batch planning failed
    #[error("Tokenization failed: {message} (correlation: {correlation_id})")]
    TokenizationFailed {
        message: String,
        correlation_id: CorrelationId,
    },

    /// The check did not finish within the configured timeout
    #[error(
        "Check timed out after {}ms (correlation: {correlation_id})",
        timeout_duration.as_millis()
    )]
    Timeout {
        timeout_duration: Duration,
        correlation_id: CorrelationId,
    },

    /// `message` is already sanitized
    #[error("{message} (correlation: {correlation_id})")]
    InternalServerError {
        message: String,
        correlation_id: CorrelationId,
    },
}

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiErrorResponse {
    /// Machine-readable error code, e.g. `RESOURCE_NOT_FOUND`
    pub error: String,
    pub message: String,
    pub correlation_id: CorrelationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// Seconds to wait before retrying, for transient errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn validation(
        message: impl Into<String>,
        field: Option<&str>,
        correlation_id: CorrelationId,
    ) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: field.map(str::to_string),
            correlation_id,
        }
    }

    pub fn internal<E: std::fmt::Display>(
        error: E,
        context: &str,
        correlation_id: CorrelationId,
    ) -> Self {
        Self::InternalServerError {
            message: sanitize_error(error, context),
            correlation_id,
        }
    }

    /// Map a checker failure onto the HTTP error it stands for
    pub fn from_limit_error(error: LimitError, correlation_id: CorrelationId) -> Self {
        match error {
            LimitError::Plan(PlanError::InvalidBatchSize { .. })
            | LimitError::TooManyBatches { .. } => {
                Self::validation(error.to_string(), Some("batch_size"), correlation_id)
            }
            LimitError::InvalidRequest { message } => {
                Self::validation(message, Some("content"), correlation_id)
            }
            LimitError::UnsupportedContentType { .. } => Self::UnsupportedContentType {
                message: error.to_string(),
                correlation_id,
            },
            LimitError::Catalog(ref catalog) if catalog.is_not_found() => Self::ResourceNotFound {
                message: error.to_string(),
                correlation_id,
            },
            LimitError::Catalog(catalog) => Self::from_catalog_error(catalog, correlation_id),
            LimitError::Tokenizer(tokenizer) => Self::from_tokenizer_error(tokenizer, correlation_id),
            LimitError::Plan(plan) => Self::TokenizationFailed {
                message: plan.to_string(),
                correlation_id,
            },
        }
    }

    pub fn from_catalog_error(error: CatalogError, correlation_id: CorrelationId) -> Self {
        if error.is_not_found() {
            Self::ResourceNotFound {
                message: error.to_string(),
                correlation_id,
            }
        } else {
            Self::internal(error, "catalog", correlation_id)
        }
    }

    fn from_tokenizer_error(error: TokenizerError, correlation_id: CorrelationId) -> Self {
        match error {
            TokenizerError::PreciseTokenizerUnavailable { .. }
            | TokenizerError::UnknownProvider { .. }
            | TokenizerError::InvalidStoreName { .. } => Self::TokenizerUnavailable {
                message: error.to_string(),
                correlation_id,
            },
            TokenizerError::Encode { .. } | TokenizerError::Decode { .. } => {
                Self::TokenizationFailed {
                    message: error.to_string(),
                    correlation_id,
                }
            }
            // Load and IO failures can name local paths
            TokenizerError::LoadFailed { .. }
            | TokenizerError::Download { .. }
            | TokenizerError::Io(_) => Self::TokenizerUnavailable {
                message: sanitize_with_message(
                    error,
                    "tokenizer load",
                    "The precise tokenizer could not be loaded; request the approximate tier",
                ),
                correlation_id,
            },
        }
    }

    pub const fn correlation_id(&self) -> &CorrelationId {
        match self {
            Self::ValidationError { correlation_id, .. }
            | Self::UnsupportedContentType { correlation_id, .. }
            | Self::ResourceNotFound { correlation_id, .. }
            | Self::TokenizerUnavailable { correlation_id, .. }
            | Self::TokenizationFailed { correlation_id, .. }
            | Self::Timeout { correlation_id, .. }
            | Self::InternalServerError { correlation_id, .. } => correlation_id,
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError { .. } | Self::UnsupportedContentType { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::TokenizerUnavailable { .. } | Self::TokenizationFailed { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ValidationError { .. } => "VALIDATION_ERROR",
            Self::UnsupportedContentType { .. } => "UNSUPPORTED_CONTENT_TYPE",
            Self::ResourceNotFound { .. } => "RESOURCE_NOT_FOUND",
            Self::TokenizerUnavailable { .. } => "TOKENIZER_UNAVAILABLE",
            Self::TokenizationFailed { .. } => "TOKENIZATION_FAILED",
            Self::Timeout { .. } => "TIMEOUT",
            Self::InternalServerError { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Message without the correlation suffix; the id travels in its own field
    fn public_message(&self) -> String {
        match self {
            Self::ValidationError { message, .. }
            | Self::UnsupportedContentType { message, .. }
            | Self::ResourceNotFound { message, .. }
            | Self::TokenizerUnavailable { message, .. }
            | Self::InternalServerError { message, .. } => message.clone(),
            Self::TokenizationFailed { message, .. } => format!("Tokenization failed: {message}"),
            Self::Timeout {
                timeout_duration, ..
            } => format!(
                "Check timed out after {}ms",
                timeout_duration.as_millis()
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let correlation_id = self.correlation_id().clone();

        if status.is_server_error() {
            error!(correlation_id = %correlation_id, error = %self, "Request failed");
        } else {
            warn!(correlation_id = %correlation_id, error = %self, "Client error");
        }

        let body = ApiErrorResponse {
            error: self.error_code().to_string(),
            message: self.public_message(),
            correlation_id: correlation_id.clone(),
            details: match &self {
                Self::ValidationError {
                    field: Some(field), ..
                } => Some(json!({ "field": field })),
                _ => None,
            },
            retry_after: match &self {
                Self::Timeout {
                    timeout_duration, ..
                } => Some(timeout_duration.as_secs().max(1)),
                _ => None,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Ok(header_value) = correlation_id.to_string().parse() {
            response
                .headers_mut()
                .insert(CORRELATION_ID_HEADER, header_value);
        }
        response
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use tokenlens_catalog::ContentType;

    fn id() -> CorrelationId {
        CorrelationId::new()
    }

    #[test]
    fn test_limit_errors_map_to_status_codes() {
        let cases = [
            (
                LimitError::Plan(PlanError::InvalidBatchSize { batch_size: 0 }),
                StatusCode::BAD_REQUEST,
            ),
            (
                LimitError::invalid_request("image content must be an object"),
                StatusCode::BAD_REQUEST,
            ),
            (
                LimitError::UnsupportedContentType {
                    provider: "openai".into(),
                    model: "whisper-1".into(),
                    expected: "text".into(),
                    actual: ContentType::Voice,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                LimitError::Catalog(CatalogError::unsupported_provider("nope")),
                StatusCode::NOT_FOUND,
            ),
            (
                LimitError::Catalog(CatalogError::model_not_found("openai", "gpt-99")),
                StatusCode::NOT_FOUND,
            ),
            (
                LimitError::Tokenizer(TokenizerError::PreciseTokenizerUnavailable {
                    provider: "anthropic".into(),
                    model: "claude-3-opus".into(),
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                LimitError::Tokenizer(TokenizerError::encode("words", "boom")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                LimitError::Plan(PlanError::NonMonotonicDecode {
                    tokenizer: "shrinking".into(),
                    index: 2,
                    previous: 100,
                    current: 50,
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                LimitError::Catalog(CatalogError::Io("/secret/path".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let description = error.to_string();
            let api_error = ApiError::from_limit_error(error, id());
            assert_eq!(api_error.status_code(), expected, "{description}");
        }
    }

    #[test]
    fn test_internal_errors_are_sanitized() {
        let api_error = ApiError::from_limit_error(
            LimitError::Catalog(CatalogError::Io("/secret/path".into())),
            id(),
        );
        let message = api_error.public_message();
        assert!(!message.contains("/secret/path"));
        assert!(message.contains("ref:"));
    }

    #[test]
    fn test_load_failures_do_not_leak_paths() {
        let api_error = ApiError::from_limit_error(
            LimitError::Tokenizer(TokenizerError::load_failed(
                "meta/llama-3-8b",
                "missing /home/me/.cache/tokenizer.json",
            )),
            id(),
        );
        assert_eq!(api_error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!api_error.public_message().contains("/home/me"));
    }

    #[tokio::test]
    async fn test_response_carries_correlation_header_and_body() {
        let correlation_id = id();
        let response = ApiError::validation(
            "batch_size must be at least 1",
            Some("batch_size"),
            correlation_id.clone(),
        )
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[CORRELATION_ID_HEADER].to_str().unwrap(),
            correlation_id.to_string()
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["field"], "batch_size");
        assert_eq!(body["correlation_id"], correlation_id.to_string());
        assert!(body.get("retry_after").is_none());
    }

    #[test]
    fn test_timeout_suggests_retry() {
        let api_error = ApiError::Timeout {
            timeout_duration: Duration::from_secs(30),
            correlation_id: id(),
        };
        assert_eq!(api_error.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api_error.error_code(), "TIMEOUT");
    }
}
