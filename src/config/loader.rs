//! Load gateway config from a JSON file, or fall back to the built-in
//! deployment table.

use crate::config::types::{
    AuthConfig, BackendRoutes, CollectionConfig, FieldKind, FieldRule, GatewayConfig,
};
use crate::error::ConfigError;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;

pub fn load_from_file(path: impl AsRef<Path>) -> Result<GatewayConfig, ConfigError> {
    let raw = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.as_ref().display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Load(e.to_string()))
}

/// The back-office deployment table: master data (companies, users,
/// plants, types, operation detail) lives behind stored functions;
/// operational data (residues, requests, affiliations, devices,
/// authorizations) lives in document collections.
pub fn default_config() -> GatewayConfig {
    let mut relational = BackendRoutes::default();
    for entity in ["companies", "operations_detail", "plants", "types", "users"] {
        relational
            .post
            .insert(format!("{entity}/by"), format!("fx_sel_{entity}"));
        relational
            .post
            .insert(format!("{entity}/create"), format!("fx_ins_{entity}"));
        relational
            .put
            .insert(format!("{entity}/update"), format!("fx_upd_{entity}"));
    }

    let mut document = BackendRoutes::default();
    for entity in [
        "affiliations",
        "authorized_operations",
        "mobile_devices",
        "requests",
        "residues",
    ] {
        document
            .post
            .insert(format!("{entity}/by"), entity.to_string());
        document
            .post
            .insert(format!("{entity}/create"), entity.to_string());
        document
            .put
            .insert(format!("{entity}/update"), entity.to_string());
    }

    GatewayConfig {
        relational,
        document,
        collections: default_collections(),
        login_function: "fx_sel_people".into(),
        auth: AuthConfig::default(),
        strict_errors: false,
    }
}

fn default_collections() -> Vec<CollectionConfig> {
    vec![
        CollectionConfig {
            name: "residues".into(),
            timestamps: true,
            fields: fields([
                ("company_id", required(FieldKind::Int)),
                ("name", required(FieldKind::String)),
                ("description", typed(FieldKind::String)),
                ("residue_type", required(FieldKind::Int)),
                ("residue_type_name", typed(FieldKind::String)),
                ("quantity", with_default(FieldKind::Float, json!(0))),
                ("status", with_default(FieldKind::Int, json!(13))),
                ("status_name", with_default(FieldKind::String, json!("pending"))),
                ("plant_id", typed(FieldKind::Int)),
                ("user_operator", typed(FieldKind::Int)),
                ("status_active", with_default(FieldKind::Bool, json!(true))),
            ]),
        },
        CollectionConfig {
            name: "affiliations".into(),
            timestamps: true,
            fields: fields([
                ("user", required(FieldKind::Int)),
                ("documents", typed(FieldKind::Object)),
                ("refs", typed(FieldKind::Object)),
                ("affiliation_state", typed(FieldKind::String)),
                ("status", with_default(FieldKind::Bool, json!(true))),
            ]),
        },
        CollectionConfig {
            name: "mobile_devices".into(),
            timestamps: true,
            fields: fields([
                ("os", typed(FieldKind::String)),
                ("maccaddress", unique(FieldKind::String)),
                ("user", typed(FieldKind::Int)),
                ("status", with_default(FieldKind::Bool, json!(true))),
            ]),
        },
        CollectionConfig {
            name: "requests".into(),
            timestamps: true,
            fields: fields([
                ("name", required(FieldKind::String)),
                ("path", required(FieldKind::String)),
                ("type", typed(FieldKind::String)),
                ("size", typed(FieldKind::Float)),
                ("status", with_default(FieldKind::Bool, json!(true))),
            ]),
        },
        CollectionConfig {
            name: "authorized_operations".into(),
            timestamps: true,
            fields: fields([
                ("code", {
                    let mut r = required(FieldKind::String);
                    r.unique = true;
                    r
                }),
                ("company_id", required(FieldKind::Int)),
                ("user_id", required(FieldKind::Int)),
                ("user_code", typed(FieldKind::String)),
                ("user_name", typed(FieldKind::String)),
                ("user_type", required(FieldKind::Int)),
                ("entity", {
                    let mut r = required(FieldKind::String);
                    r.allowed = Some(
                        [
                            "companies",
                            "users",
                            "plants",
                            "residues",
                            "operations_detail",
                            "types",
                            "authorized_operations",
                        ]
                        .iter()
                        .map(|s| json!(s))
                        .collect(),
                    );
                    r
                }),
                ("actions", typed(FieldKind::Object)),
            ]),
        },
    ]
}

fn fields<const N: usize>(pairs: [(&str, FieldRule); N]) -> HashMap<String, FieldRule> {
    pairs
        .into_iter()
        .map(|(name, rule)| (name.to_string(), rule))
        .collect()
}

fn typed(kind: FieldKind) -> FieldRule {
    FieldRule {
        kind: Some(kind),
        ..FieldRule::default()
    }
}

fn required(kind: FieldKind) -> FieldRule {
    FieldRule {
        kind: Some(kind),
        required: true,
        ..FieldRule::default()
    }
}

fn unique(kind: FieldKind) -> FieldRule {
    FieldRule {
        kind: Some(kind),
        unique: true,
        ..FieldRule::default()
    }
}

fn with_default(kind: FieldKind, value: Value) -> FieldRule {
    FieldRule {
        kind: Some(kind),
        default: Some(value),
        ..FieldRule::default()
    }
}
