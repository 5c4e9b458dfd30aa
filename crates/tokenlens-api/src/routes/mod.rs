pub mod check;
pub mod health;
pub mod providers;

use axum::{Router, extract::DefaultBodyLimit, middleware};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;
    let enable_docs = state.config.enable_docs;

    let mut router = Router::new()
        .merge(health::routes())
        .merge(check::routes(state.clone()))
        .merge(providers::routes(state));

    if enable_docs {
        router = router
            .merge(crate::openapi::routes())
            .merge(crate::openapi::swagger_ui());
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(
            crate::middleware::correlation_id_middleware,
        ))
}
