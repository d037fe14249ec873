//! Resolved routing table: config validated and frozen for runtime use.

use crate::config::types::GatewayConfig;
use crate::config::validator::validate;
use crate::error::ConfigError;
use axum::http::Method;
use std::collections::HashMap;

/// Which executor serves a bound route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Relational,
    Document,
}

/// Filter convention callers must use for an entity. The two backends
/// speak different grammars and the table keeps that contract explicit
/// instead of normalizing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterShape {
    /// Array of row-filter objects, interpreted by the stored function.
    RowFilters,
    /// Single object of field constraints matched against documents.
    FieldConstraints,
}

/// Verb segment of a route key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    By,
    Create,
    Update,
}

impl Action {
    pub fn parse(s: &str) -> Option<Action> {
        match s {
            "by" => Some(Action::By),
            "create" => Some(Action::Create),
            "update" => Some(Action::Update),
            _ => None,
        }
    }

    /// The HTTP method an action is served under.
    pub fn method(self) -> Method {
        match self {
            Action::By | Action::Create => Method::POST,
            Action::Update => Method::PUT,
        }
    }
}

/// One resolved route target.
#[derive(Clone, Debug)]
pub struct BackendBinding {
    pub kind: BackendKind,
    /// Stored-function name (relational) or collection name (document).
    pub identifier: String,
    pub filter_shape: FilterShape,
}

/// Immutable `(method, "entity/action")` lookup table, built once at
/// startup. Both backend tables could in principle claim the same key;
/// resolution always consults the relational table first, so a document
/// route shadowed by a relational one never wins (the validator warns
/// about such collisions at startup).
#[derive(Debug, Default)]
pub struct RoutingTable {
    relational: HashMap<(Method, String), BackendBinding>,
    document: HashMap<(Method, String), BackendBinding>,
}

impl RoutingTable {
    pub fn resolve(&self, method: &Method, entity_action: &str) -> Option<&BackendBinding> {
        let key = (method.clone(), entity_action.to_string());
        self.relational.get(&key).or_else(|| self.document.get(&key))
    }

    pub fn len(&self) -> usize {
        self.relational.len() + self.document.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relational.is_empty() && self.document.is_empty()
    }

    /// Keys claimed by both backends (the document side is shadowed).
    pub(crate) fn collisions(&self) -> Vec<&(Method, String)> {
        self.document
            .keys()
            .filter(|k| self.relational.contains_key(*k))
            .collect()
    }
}

/// Validate the config and freeze the routing table. Misconfiguration is
/// rejected here, at startup, never per request.
pub fn resolve(config: &GatewayConfig) -> Result<RoutingTable, ConfigError> {
    validate(config)?;

    let mut table = RoutingTable::default();
    for (method, entries) in [
        (Method::POST, &config.relational.post),
        (Method::PUT, &config.relational.put),
    ] {
        for (key, function) in entries {
            table.relational.insert(
                (method.clone(), key.clone()),
                BackendBinding {
                    kind: BackendKind::Relational,
                    identifier: function.clone(),
                    filter_shape: FilterShape::RowFilters,
                },
            );
        }
    }
    for (method, entries) in [
        (Method::POST, &config.document.post),
        (Method::PUT, &config.document.put),
    ] {
        for (key, collection) in entries {
            table.document.insert(
                (method.clone(), key.clone()),
                BackendBinding {
                    kind: BackendKind::Document,
                    identifier: collection.clone(),
                    filter_shape: FilterShape::FieldConstraints,
                },
            );
        }
    }

    for (method, key) in table.collisions() {
        tracing::warn!(%method, key = %key, "route claimed by both backends; relational wins");
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::default_config;

    #[test]
    fn resolves_every_configured_pair() {
        let config = default_config();
        let table = resolve(&config).unwrap();

        for (key, function) in &config.relational.post {
            let binding = table.resolve(&Method::POST, key).expect(key);
            assert_eq!(binding.kind, BackendKind::Relational);
            assert_eq!(&binding.identifier, function);
            assert_eq!(binding.filter_shape, FilterShape::RowFilters);
        }
        for (key, collection) in &config.document.put {
            let binding = table.resolve(&Method::PUT, key).expect(key);
            assert_eq!(binding.kind, BackendKind::Document);
            assert_eq!(&binding.identifier, collection);
            assert_eq!(binding.filter_shape, FilterShape::FieldConstraints);
        }
    }

    #[test]
    fn unknown_pairs_resolve_to_none() {
        let table = resolve(&default_config()).unwrap();
        assert!(table.resolve(&Method::POST, "martians/by").is_none());
        // Right key, wrong method.
        assert!(table.resolve(&Method::PUT, "companies/by").is_none());
        assert!(table.resolve(&Method::POST, "residues/update").is_none());
    }

    #[test]
    fn relational_wins_a_cross_backend_collision() {
        let mut config = default_config();
        config
            .relational
            .post
            .insert("residues/by".into(), "fx_sel_residues".into());
        let table = resolve(&config).unwrap();
        let binding = table.resolve(&Method::POST, "residues/by").unwrap();
        assert_eq!(binding.kind, BackendKind::Relational);
        assert_eq!(table.collisions().len(), 1);
    }
}
