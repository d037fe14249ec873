//! Dispatch: resolve `(method, entity/action)` and run the bound
//! executor.
//!
//! The dispatcher is a pure routing step. It knows nothing about entity
//! schemas and never inspects payload shape; each executor owns its own
//! input checks. It is also the only layer that turns a route miss into
//! the "endpoint not found" failure.

use crate::config::resolved::{Action, BackendBinding, BackendKind};
use crate::document::ListOptions;
use crate::error::GatewayError;
use crate::relational::RelationalExecutor;
use crate::state::AppState;
use axum::http::Method;
use serde_json::{Map, Value};

/// `POST /:entity/by` — list through whichever backend claims the key.
/// The body carries `filter` (shape depends on the backend; see
/// `FilterShape`) and, for document entities, `options`.
pub async fn dispatch_by(
    state: &AppState,
    entity: &str,
    body: &Value,
) -> Result<Value, GatewayError> {
    let binding = resolve_binding(state, Action::By, entity)?;
    let empty = Value::Object(Map::new());
    let filter = body.get("filter").unwrap_or(&empty);
    match binding.kind {
        BackendKind::Relational => {
            RelationalExecutor::list(&state.pool, &binding.identifier, filter).await
        }
        BackendKind::Document => {
            let options = parse_options(body.get("options"))?;
            state.store.list(&binding.identifier, filter, &options)
        }
    }
}

/// `POST /:entity/create` — insert through the bound backend. The
/// payload is the `news` body field, already extracted by the handler.
pub async fn dispatch_create(
    state: &AppState,
    entity: &str,
    news: &Value,
) -> Result<Value, GatewayError> {
    let binding = resolve_binding(state, Action::Create, entity)?;
    match binding.kind {
        BackendKind::Relational => {
            RelationalExecutor::create(&state.pool, &binding.identifier, news).await
        }
        BackendKind::Document => state.store.create(&binding.identifier, news),
    }
}

/// `PUT /:entity/update` — update through the bound backend. The
/// payload is the `updateds` body field.
pub async fn dispatch_update(
    state: &AppState,
    entity: &str,
    updateds: &Value,
) -> Result<Value, GatewayError> {
    let binding = resolve_binding(state, Action::Update, entity)?;
    match binding.kind {
        BackendKind::Relational => {
            RelationalExecutor::update(&state.pool, &binding.identifier, updateds).await
        }
        BackendKind::Document => state.store.update(&binding.identifier, updateds),
    }
}

fn resolve_binding<'a>(
    state: &'a AppState,
    action: Action,
    entity: &str,
) -> Result<&'a BackendBinding, GatewayError> {
    let method: Method = action.method();
    let key = format!(
        "{entity}/{}",
        match action {
            Action::By => "by",
            Action::Create => "create",
            Action::Update => "update",
        }
    );
    match state.routing.resolve(&method, &key) {
        Some(binding) => {
            tracing::debug!(%method, key = %key, kind = ?binding.kind, identifier = %binding.identifier, "route resolved");
            Ok(binding)
        }
        None => {
            tracing::warn!(%method, key = %key, "no backend claims this route");
            Err(GatewayError::EndpointNotFound)
        }
    }
}

fn parse_options(options: Option<&Value>) -> Result<ListOptions, GatewayError> {
    match options {
        None | Some(Value::Null) => Ok(ListOptions::default()),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| GatewayError::BadRequest(format!("invalid options: {e}"))),
    }
}
