pub mod error;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use middleware::{CORRELATION_ID_HEADER, RequestContext, correlation_id_middleware};
pub use server::serve;
pub use state::AppState;
