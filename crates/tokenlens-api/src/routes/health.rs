use crate::middleware::RequestContext;
use axum::{Extension, Json, Router, routing::get};
use serde::Serialize;
use tokenlens_common::CorrelationId;
use tracing::{debug, instrument};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub correlation_id: CorrelationId,
}

pub fn routes() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
#[instrument(skip(context), fields(correlation_id))]
pub async fn health_check(context: Option<Extension<RequestContext>>) -> Json<HealthResponse> {
    let correlation_id = RequestContext::correlation_id_or_new(context.as_deref());
    tracing::Span::current().record("correlation_id", correlation_id.to_string());
    debug!(correlation_id = %correlation_id, "Health check request");

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        correlation_id,
    })
}
