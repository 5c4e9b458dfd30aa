//! `OpenAPI` document and Swagger UI

use axum::{Json, Router, response::IntoResponse, routing::get};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::check::check_limits_handler,
        crate::routes::providers::list_providers,
        crate::routes::providers::list_models,
        crate::routes::providers::get_model,
    ),
    components(
        schemas(
            crate::routes::health::HealthResponse,
            crate::routes::check::CheckLimitsRequest,
            crate::routes::providers::ProvidersResponse,
            crate::routes::providers::ModelsResponse,
            crate::routes::providers::ModelEntry,
            crate::error::ApiErrorResponse,
            tokenlens_limits::CheckReport,
            tokenlens_limits::LimitCheckResult,
            tokenlens_limits::MediaCheckResult,
            tokenlens_limits::Batch,
            tokenlens_limits::Violation,
            tokenlens_limits::ProviderSummary,
            tokenlens_limits::ImageRequest,
            tokenlens_limits::VideoRequest,
            tokenlens_limits::VoiceRequest,
            tokenlens_limits::AvatarRequest,
            tokenlens_catalog::ModelLimits,
            tokenlens_catalog::ContentType,
            tokenlens_common::TokenizerTier,
        )
    ),
    tags(
        (name = "limits", description = "Token and media limit checks"),
        (name = "catalog", description = "Provider and model catalog"),
        (name = "health", description = "Service health"),
    ),
    info(
        title = "Tokenlens API",
        version = "0.2.0",
        description = "Token counting, limit checking and batch planning for AI model providers",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:8000", description = "Local development server"))
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}

/// `GET /openapi.json`
pub fn routes() -> Router {
    Router::new().route("/openapi.json", get(openapi_json))
}

pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
