//! Raw config types as deserialized from the gateway config file.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Full gateway configuration: two routing tables, the document
/// collection registry, and server-level settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Stored-function routes: method -> "entity/action" -> function name.
    #[serde(default)]
    pub relational: BackendRoutes,
    /// Collection routes: method -> "entity/action" -> collection name.
    #[serde(default)]
    pub document: BackendRoutes,
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,
    /// Stored function the login endpoint queries for credentials.
    #[serde(default = "default_login_function")]
    pub login_function: String,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Switch the whole surface to taxonomy-faithful status codes.
    #[serde(default)]
    pub strict_errors: bool,
}

/// Route keys for one backend, grouped by HTTP method. `by` and
/// `create` live under POST, `update` under PUT.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BackendRoutes {
    #[serde(default)]
    pub post: HashMap<String, String>,
    #[serde(default)]
    pub put: HashMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,
    /// Stamp `createdAt`/`updatedAt` on writes. On by default; the
    /// default list sort keys on `createdAt`.
    #[serde(default = "default_true")]
    pub timestamps: bool,
    #[serde(default)]
    pub fields: HashMap<String, FieldRule>,
}

/// Per-field document rule. All checks are optional; an empty rule
/// accepts anything.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FieldRule {
    #[serde(default, rename = "type")]
    pub kind: Option<FieldKind>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
    /// Collection this field references; enables populate on reads.
    #[serde(default)]
    pub reference: Option<String>,
    /// Value filled in on insert when the field is absent.
    #[serde(default)]
    pub default: Option<Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Int,
    Float,
    Bool,
    Object,
    Array,
}

impl FieldKind {
    pub fn type_name(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Bool => "bool",
            FieldKind::Object => "object",
            FieldKind::Array => "array",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_secret")]
    pub secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            secret: default_secret(),
            token_ttl_minutes: default_token_ttl(),
        }
    }
}

fn default_login_function() -> String {
    "fx_sel_people".into()
}

fn default_secret() -> String {
    "CHANGE_THIS_SECRET_IN_PRODUCTION".into()
}

fn default_token_ttl() -> i64 {
    480
}

fn default_true() -> bool {
    true
}
