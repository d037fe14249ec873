//! Startup validation of the gateway config.

use crate::config::resolved::Action;
use crate::config::types::{BackendRoutes, GatewayConfig};
use crate::error::ConfigError;
use std::collections::HashSet;

/// Reject misconfiguration before the table is frozen: malformed or
/// misplaced route keys, function names that are not plain identifiers,
/// document routes pointing at unregistered collections, duplicate
/// collection names.
pub fn validate(config: &GatewayConfig) -> Result<(), ConfigError> {
    let mut collections = HashSet::new();
    for coll in &config.collections {
        if !collections.insert(coll.name.as_str()) {
            return Err(ConfigError::DuplicateCollection(coll.name.clone()));
        }
    }

    validate_routes(&config.relational, "relational", |key, identifier| {
        if !is_sql_identifier(identifier) {
            return Err(ConfigError::InvalidFunctionName {
                key: key.to_string(),
                identifier: identifier.to_string(),
            });
        }
        Ok(())
    })?;
    if !is_sql_identifier(&config.login_function) {
        return Err(ConfigError::InvalidFunctionName {
            key: "login".into(),
            identifier: config.login_function.clone(),
        });
    }

    validate_routes(&config.document, "document", |key, identifier| {
        if !collections.contains(identifier) {
            return Err(ConfigError::UnknownCollection {
                key: key.to_string(),
                collection: identifier.to_string(),
            });
        }
        Ok(())
    })?;

    Ok(())
}

fn validate_routes(
    routes: &BackendRoutes,
    backend: &'static str,
    check_identifier: impl Fn(&str, &str) -> Result<(), ConfigError>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (method, entries) in [("POST", &routes.post), ("PUT", &routes.put)] {
        for (key, identifier) in entries {
            let action_str = key
                .rsplit_once('/')
                .map(|(_, a)| a)
                .ok_or_else(|| ConfigError::MalformedRouteKey(key.clone()))?;
            let action = Action::parse(action_str).ok_or_else(|| ConfigError::UnknownAction {
                key: key.clone(),
                action: action_str.to_string(),
            })?;
            if action.method().as_str() != method {
                return Err(ConfigError::ActionMethodMismatch {
                    key: key.clone(),
                    action: action_str.to_string(),
                    method,
                });
            }
            if !seen.insert((method, key.as_str())) {
                return Err(ConfigError::DuplicateRoute {
                    backend,
                    key: key.clone(),
                });
            }
            check_identifier(key, identifier)?;
        }
    }
    Ok(())
}

/// Function names are interpolated as quoted identifiers, so only plain
/// identifiers are accepted; values never take this path.
fn is_sql_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::default_config;

    #[test]
    fn default_config_is_valid() {
        validate(&default_config()).unwrap();
    }

    #[test]
    fn rejects_function_names_that_are_not_identifiers() {
        let mut config = default_config();
        config
            .relational
            .post
            .insert("evil/by".into(), "fx; DROP TABLE users".into());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidFunctionName { .. })
        ));
    }

    #[test]
    fn rejects_document_route_to_unregistered_collection() {
        let mut config = default_config();
        config
            .document
            .post
            .insert("ghosts/by".into(), "ghosts".into());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::UnknownCollection { .. })
        ));
    }

    #[test]
    fn rejects_update_bound_under_post() {
        let mut config = default_config();
        config
            .relational
            .post
            .insert("companies/update".into(), "fx_upd_companies".into());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::ActionMethodMismatch { .. })
        ));
    }

    #[test]
    fn rejects_unknown_action() {
        let mut config = default_config();
        config
            .relational
            .post
            .insert("companies/destroy".into(), "fx_del_companies".into());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::UnknownAction { .. })
        ));
    }

    #[test]
    fn identifier_check_is_strict() {
        assert!(is_sql_identifier("fx_sel_companies"));
        assert!(is_sql_identifier("_private"));
        assert!(!is_sql_identifier("1fx"));
        assert!(!is_sql_identifier("fx-name"));
        assert!(!is_sql_identifier(""));
        assert!(!is_sql_identifier("fx name"));
    }
}
