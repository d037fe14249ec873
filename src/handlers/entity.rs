//! Generic entity handlers: by, create, update, the delete alias, and
//! login. Handlers extract the body field each operation requires and
//! hand the payload to the dispatcher; every outcome leaves through
//! `response::respond`.

use crate::error::GatewayError;
use crate::extractors::BearerClaims;
use crate::relational::RelationalExecutor;
use crate::response::respond;
use crate::service::{dispatch_by, dispatch_create, dispatch_update};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde_json::{json, Map, Value};

fn body_or_empty(body: Option<Json<Value>>) -> Value {
    body.map(|Json(v)| v)
        .unwrap_or_else(|| Value::Object(Map::new()))
}

pub async fn entities_by(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    _claims: BearerClaims,
    body: Option<Json<Value>>,
) -> Response {
    let body = body_or_empty(body);
    let result = dispatch_by(&state, &entity, &body).await;
    respond(state.status_mode, StatusCode::OK, result)
}

pub async fn entities_create(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    _claims: BearerClaims,
    body: Option<Json<Value>>,
) -> Response {
    let body = body_or_empty(body);
    let result = match body.get("news") {
        None | Some(Value::Null) => Err(GatewayError::MissingBody("no data provided to insert")),
        Some(news) => dispatch_create(&state, &entity, news).await,
    };
    respond(state.status_mode, StatusCode::CREATED, result)
}

pub async fn entities_update(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    _claims: BearerClaims,
    body: Option<Json<Value>>,
) -> Response {
    let body = body_or_empty(body);
    let result = match body.get("updateds") {
        None | Some(Value::Null) => Err(GatewayError::MissingBody("no data provided to update")),
        Some(updateds) => dispatch_update(&state, &entity, updateds).await,
    };
    respond(state.status_mode, StatusCode::OK, result)
}

/// KNOWN DEFECT, PRESERVED ON PURPOSE: the legacy surface wires
/// `POST /:entity/delete` to the create handler, so "delete" inserts
/// the `news` payload. Callers ship against this behavior; do not
/// implement real delete semantics here without a coordinated contract
/// change.
pub async fn entities_delete(
    state: State<AppState>,
    entity: Path<String>,
    claims: BearerClaims,
    body: Option<Json<Value>>,
) -> Response {
    entities_create(state, entity, claims, body).await
}

/// `POST /login`: query the configured credential function with the
/// caller's filter. A matching first row gets a signed token attached;
/// an empty result is still `success: true` with the empty row set, as
/// the legacy surface answers.
pub async fn login(State(state): State<AppState>, body: Option<Json<Value>>) -> Response {
    let body = body_or_empty(body);
    let empty = Value::Object(Map::new());
    let filter = body.get("filter").unwrap_or(&empty);
    let result = login_flow(&state, filter).await;
    respond(state.status_mode, StatusCode::OK, result)
}

async fn login_flow(state: &AppState, filter: &Value) -> Result<Value, GatewayError> {
    let rows = RelationalExecutor::list(&state.pool, &state.login_function, filter).await?;
    let rows = match rows {
        Value::Array(rows) => rows,
        other => return Ok(other),
    };
    match rows.into_iter().next() {
        Some(Value::Object(mut user)) => {
            let subject = user
                .get("id")
                .map(|id| match id {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_default();
            let token = state.signer.sign(&subject)?;
            user.insert("token".into(), json!(token));
            Ok(Value::Object(user))
        }
        Some(other) => Ok(other),
        None => Ok(Value::Array(Vec::new())),
    }
}
