//! `POST /check-limits`
//!
//! ```json
//! POST /check-limits
//! {
//!   "provider": "openai",
//!   "model": "gpt-4",
//!   "model_type": "text",
//!   "content": "Hello, world!",
//!   "tokenizer": "precise"
//! }
//! ```
//!
//! Token-limited types (`text`, `embedding`, `rerank`) take a string and
//! answer with a `LimitCheckResult`. Media types take an object, or a string
//! used as the prompt, script or spoken text, and answer with a
//! `MediaCheckResult`.

use crate::middleware::RequestContext;
use crate::state::AppState;
use crate::{ApiError, ApiResult};
use axum::{
    Json, Router,
    extract::{Extension, State, rejection::JsonRejection},
    routing::post,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokenlens_catalog::ContentType;
use tokenlens_common::{CorrelationId, TokenizerTier};
use tokenlens_limits::{CheckReport, ContentRequest, TextCheckOptions};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "provider": "openai",
    "model": "gpt-4",
    "model_type": "text",
    "content": "Hello, world!"
}))]
pub struct CheckLimitsRequest {
    /// Provider name or alias, e.g. `openai` or `claude`
    pub provider: String,
    pub model: String,
    pub model_type: ContentType,
    /// A string for token-limited types, an object for media types
    #[schema(value_type = Object)]
    pub content: Value,
    /// Tokenizer tier; the server default when absent
    #[serde(default)]
    pub tokenizer: Option<TokenizerTier>,
    /// Split size for over-limit text; must be at least 1
    #[serde(default)]
    pub batch_size: Option<usize>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/check-limits", post(check_limits_handler))
        .with_state(state)
}

/// Check content against a model's limits
///
/// # Errors
///
/// Returns `ApiError` for malformed bodies, unknown names, mismatched content
/// types, tokenizer failures and timeouts.
#[utoipa::path(
    post,
    path = "/check-limits",
    tag = "limits",
    request_body = CheckLimitsRequest,
    responses(
        (status = 200, description = "Check result", body = CheckReport),
        (status = 400, description = "Invalid request or content type", body = crate::ApiErrorResponse),
        (status = 404, description = "Unknown provider or model", body = crate::ApiErrorResponse),
        (status = 422, description = "Tokenizer unavailable or tokenization failed", body = crate::ApiErrorResponse),
        (status = 503, description = "Check timed out", body = crate::ApiErrorResponse)
    )
)]
#[instrument(skip(state, context, payload), fields(correlation_id))]
pub async fn check_limits_handler(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
    payload: Result<Json<CheckLimitsRequest>, JsonRejection>,
) -> ApiResult<Json<CheckReport>> {
    let start = Instant::now();
    let correlation_id = RequestContext::correlation_id_or_new(context.as_deref());
    tracing::Span::current().record("correlation_id", correlation_id.to_string());

    let Json(req) = payload.map_err(|rejection| {
        ApiError::validation(rejection.body_text(), None, correlation_id.clone())
    })?;
    validate_names(&req, &correlation_id)?;

    info!(
        correlation_id = %correlation_id,
        provider = %req.provider,
        model = %req.model,
        model_type = %req.model_type,
        "Processing limit check"
    );

    let request = ContentRequest::from_parts(req.model_type, req.content)
        .map_err(|e| ApiError::from_limit_error(e, correlation_id.clone()))?;
    let options = TextCheckOptions {
        tier: req.tokenizer,
        batch_size: req.batch_size,
    };

    let checker = Arc::clone(&state.checker);
    let provider = req.provider;
    let model = req.model;
    let timeout_duration = Duration::from_secs(state.config.timeout_seconds);
    let task = tokio::task::spawn_blocking(move || {
        checker.check(&provider, &model, &request, &options)
    });

    let report = match tokio::time::timeout(timeout_duration, task).await {
        Ok(Ok(Ok(report))) => report,
        Ok(Ok(Err(limit_error))) => {
            return Err(ApiError::from_limit_error(limit_error, correlation_id));
        }
        Ok(Err(join_error)) => {
            return Err(ApiError::internal(join_error, "limit check task", correlation_id));
        }
        Err(_elapsed) => {
            warn!(
                correlation_id = %correlation_id,
                timeout_ms = timeout_duration.as_millis(),
                "Limit check timed out"
            );
            return Err(ApiError::Timeout {
                timeout_duration,
                correlation_id,
            });
        }
    };

    info!(
        correlation_id = %correlation_id,
        within_limit = report.is_within_limit(),
        elapsed_ms = start.elapsed().as_millis(),
        "Limit check completed"
    );
    Ok(Json(report))
}

fn validate_names(req: &CheckLimitsRequest, correlation_id: &CorrelationId) -> ApiResult<()> {
    if req.provider.trim().is_empty() {
        return Err(ApiError::validation(
            "provider must not be empty",
            Some("provider"),
            correlation_id.clone(),
        ));
    }
    if req.model.trim().is_empty() {
        return Err(ApiError::validation(
            "model must not be empty",
            Some("model"),
            correlation_id.clone(),
        ));
    }
    Ok(())
}
