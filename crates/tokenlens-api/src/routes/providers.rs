//! Catalog browsing endpoints

use crate::middleware::RequestContext;
use crate::state::AppState;
use crate::{ApiError, ApiResult};
use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokenlens_catalog::{ContentType, ModelLimits};
use tokenlens_limits::ProviderSummary;
use tracing::{debug, instrument};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, ToSchema)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderSummary>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ModelsQuery {
    /// Only list models of this content type
    #[serde(rename = "type")]
    pub content_type: Option<ContentType>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModelEntry {
    pub name: String,
    pub limits: ModelLimits,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModelsResponse {
    /// Canonical provider name, even when an alias was requested
    pub provider: String,
    pub models: Vec<ModelEntry>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/providers", get(list_providers))
        .route("/providers/{provider}/models", get(list_models))
        .route("/providers/{provider}/models/{model}", get(get_model))
        .with_state(state)
}

/// List every catalog provider
#[utoipa::path(
    get,
    path = "/providers",
    tag = "catalog",
    responses((status = 200, description = "Provider summaries", body = ProvidersResponse))
)]
#[instrument(skip(state, context), fields(correlation_id))]
pub async fn list_providers(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
) -> Json<ProvidersResponse> {
    let correlation_id = RequestContext::correlation_id_or_new(context.as_deref());
    tracing::Span::current().record("correlation_id", correlation_id.to_string());

    let providers = state.checker.provider_summaries();
    debug!(correlation_id = %correlation_id, count = providers.len(), "Listed providers");
    Json(ProvidersResponse { providers })
}

/// List a provider's models, optionally filtered by content type
///
/// # Errors
/// 404 when the provider is unknown
#[utoipa::path(
    get,
    path = "/providers/{provider}/models",
    tag = "catalog",
    params(("provider" = String, Path, description = "Provider name or alias"), ModelsQuery),
    responses(
        (status = 200, description = "Models and their limits", body = ModelsResponse),
        (status = 404, description = "Unknown provider", body = crate::ApiErrorResponse)
    )
)]
#[instrument(skip(state, context), fields(correlation_id))]
pub async fn list_models(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
    Path(provider): Path<String>,
    Query(query): Query<ModelsQuery>,
) -> ApiResult<Json<ModelsResponse>> {
    let correlation_id = RequestContext::correlation_id_or_new(context.as_deref());
    tracing::Span::current().record("correlation_id", correlation_id.to_string());

    let catalog = state.checker.catalog();
    let canonical = catalog
        .resolve_provider(&provider)
        .map_err(|e| ApiError::from_catalog_error(e, correlation_id.clone()))?;
    let models = catalog
        .models_by_type(canonical, query.content_type)
        .map_err(|e| ApiError::from_catalog_error(e, correlation_id))?
        .into_iter()
        .map(|(name, limits)| ModelEntry {
            name: name.to_string(),
            limits: limits.clone(),
        })
        .collect();

    Ok(Json(ModelsResponse {
        provider: canonical.to_string(),
        models,
    }))
}

/// Limits of a single model
///
/// # Errors
/// 404 when the provider or model is unknown
#[utoipa::path(
    get,
    path = "/providers/{provider}/models/{model}",
    tag = "catalog",
    params(
        ("provider" = String, Path, description = "Provider name or alias"),
        ("model" = String, Path, description = "Model name")
    ),
    responses(
        (status = 200, description = "Model limits", body = ModelEntry),
        (status = 404, description = "Unknown provider or model", body = crate::ApiErrorResponse)
    )
)]
#[instrument(skip(state, context), fields(correlation_id))]
pub async fn get_model(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
    Path((provider, model)): Path<(String, String)>,
) -> ApiResult<Json<ModelEntry>> {
    let correlation_id = RequestContext::correlation_id_or_new(context.as_deref());
    tracing::Span::current().record("correlation_id", correlation_id.to_string());

    let catalog = state.checker.catalog();
    let (name, limits) = catalog
        .resolve_provider(&provider)
        .and_then(|canonical| catalog.resolve_model(canonical, &model))
        .map_err(|e| ApiError::from_catalog_error(e, correlation_id))?;

    Ok(Json(ModelEntry {
        name: name.to_string(),
        limits: limits.clone(),
    }))
}
