//! Typed errors for the gateway and its startup configuration.

use thiserror::Error;

/// Rejections raised while building the routing table at startup.
/// Every variant is a misconfiguration the process refuses to boot with;
/// nothing here is reachable from a request.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("route '{0}' has no '/' separating entity and action")]
    MalformedRouteKey(String),
    #[error("route '{key}': unknown action '{action}'")]
    UnknownAction { key: String, action: String },
    #[error("route '{key}': action '{action}' is not served under {method}")]
    ActionMethodMismatch {
        key: String,
        action: String,
        method: &'static str,
    },
    #[error("route '{key}': '{identifier}' is not a valid function identifier")]
    InvalidFunctionName { key: String, identifier: String },
    #[error("route '{key}' names unregistered collection '{collection}'")]
    UnknownCollection { key: String, collection: String },
    #[error("duplicate {backend} route '{key}'")]
    DuplicateRoute { backend: &'static str, key: String },
    #[error("collection '{0}' is registered twice")]
    DuplicateCollection(String),
    #[error("config load: {0}")]
    Load(String),
}

/// Request-time failure taxonomy. Executors raise these; the response
/// layer is the single place they become wire responses.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// No backend claims the `(method, entity/action)` key.
    #[error("endpoint not found")]
    EndpointNotFound,
    #[error("not found: {0}")]
    NotFound(String),
    /// The request body lacks the field the operation requires (`news`
    /// for create, `updateds` for update). Distinct from `BadRequest`
    /// because the legacy surface answers 400 only for this case.
    #[error("{0}")]
    MissingBody(&'static str),
    #[error("bad request: {0}")]
    BadRequest(String),
    /// The backend executed without a transport error but reported
    /// business failure through its return shape.
    #[error("{0}")]
    Logical(String),
    /// Document schema validation; one message per failing field.
    #[error("validation errors: {}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("duplicate value in unique field '{0}'")]
    Conflict(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Field-level messages for the envelope's `validation` slot.
    /// Only document schema failures carry them.
    pub fn validation_messages(&self) -> Option<Vec<String>> {
        match self {
            GatewayError::Validation(msgs) => Some(msgs.clone()),
            _ => None,
        }
    }
}
