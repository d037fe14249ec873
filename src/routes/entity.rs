//! Gateway routes: one parameterized set of entity endpoints plus login.

use crate::handlers::entity::{
    entities_by, entities_create, entities_delete, entities_update, login,
};
use crate::response::Envelope;
use crate::state::AppState;
use axum::response::IntoResponse;
use axum::{
    routing::{post, put},
    Json, Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;

/// Request bodies above this are refused before dispatch.
const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

pub fn gateway_routes(state: AppState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/:entity/by", post(entities_by))
        .route("/:entity/create", post(entities_create))
        .route("/:entity/update", put(entities_update))
        // POST /:entity/delete is the create handler. See the note on
        // `entities_delete`: a shipped defect the callers depend on.
        .route("/:entity/delete", post(entities_delete))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(CatchPanicLayer::custom(panic_envelope))
        .with_state(state)
}

/// Last-resort boundary: a panicking handler still answers the envelope,
/// never a bare 500 or a stack trace.
fn panic_envelope(_panic: Box<dyn std::any::Any + Send + 'static>) -> axum::response::Response {
    let err = crate::error::GatewayError::Internal("unexpected failure".into());
    (axum::http::StatusCode::OK, Json(Envelope::fail(&err))).into_response()
}
