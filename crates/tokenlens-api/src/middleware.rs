//! Correlation id propagation
//!
//! A caller-supplied `X-Correlation-ID` is kept when it is a valid UUID;
//! otherwise a fresh id is generated. Handlers read it from the
//! [`RequestContext`] extension and every response echoes it.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tokenlens_common::CorrelationId;

pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Per-request data made available to handlers
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: CorrelationId,
}

impl RequestContext {
    /// Correlation id from an optional extension, generated when the middleware did not run
    pub fn correlation_id_or_new(context: Option<&Self>) -> CorrelationId {
        context.map_or_else(CorrelationId::new, |ctx| ctx.correlation_id.clone())
    }
}

pub async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(CorrelationId::parse)
        .unwrap_or_default();

    request.extensions_mut().insert(RequestContext {
        correlation_id: correlation_id.clone(),
    });

    let mut response = next.run(request).await;
    if !response.headers().contains_key(CORRELATION_ID_HEADER)
        && let Ok(value) = HeaderValue::from_str(&correlation_id.to_string())
    {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}
