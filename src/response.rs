//! Response envelope and status mapping.
//!
//! Every call answers the same four-key envelope regardless of backend.
//! The legacy surface answers 200 for most failures (the error lives in
//! the body); both mappings are confined to this module so the surface
//! can be switched without touching executor logic.

use crate::error::GatewayError;
use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Serialize;
use serde_json::Value;

/// Uniform wire shape. All four keys are always serialized; exactly one
/// of `data`/`error` is meaningfully populated, and `validation` only
/// carries document schema messages.
#[derive(Serialize, Debug)]
pub struct Envelope {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub validation: Option<Vec<String>>,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Envelope {
            success: true,
            data: Some(data),
            error: None,
            validation: None,
        }
    }

    pub fn fail(err: &GatewayError) -> Self {
        Envelope {
            success: false,
            data: None,
            error: Some(err.to_string()),
            validation: err.validation_messages(),
        }
    }
}

/// How failures map to HTTP status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusMode {
    /// Backward-compatible surface: 404 for an unknown endpoint, 400 for
    /// a missing body field, 200 with an error envelope for everything
    /// else.
    Legacy,
    /// Taxonomy-faithful codes: 404/400/422/409/500.
    Strict,
}

pub fn status_for(mode: StatusMode, err: &GatewayError) -> StatusCode {
    match mode {
        StatusMode::Legacy => legacy_status(err),
        StatusMode::Strict => strict_status(err),
    }
}

fn legacy_status(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::EndpointNotFound => StatusCode::NOT_FOUND,
        GatewayError::MissingBody(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    }
}

fn strict_status(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::EndpointNotFound | GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
        GatewayError::MissingBody(_) | GatewayError::BadRequest(_) | GatewayError::Logical(_) => {
            StatusCode::BAD_REQUEST
        }
        GatewayError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        GatewayError::Conflict(_) => StatusCode::CONFLICT,
        GatewayError::Config(_) | GatewayError::Db(_) | GatewayError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Render one executor outcome. `ok_status` is the success code for the
/// operation (200 for reads and updates, 201 for create).
pub fn respond(
    mode: StatusMode,
    ok_status: StatusCode,
    result: Result<Value, GatewayError>,
) -> Response {
    match result {
        Ok(data) => (ok_status, Json(Envelope::ok(data))).into_response(),
        Err(err) => (status_for(mode, &err), Json(Envelope::fail(&err))).into_response(),
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (legacy_status(&self), Json(Envelope::fail(&self))).into_response()
    }
}
