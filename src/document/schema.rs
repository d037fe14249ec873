//! Document validation against per-field rules.
//!
//! Unlike a constraint check that stops at the first offence, validation
//! collects one message per failing field so the caller sees the whole
//! picture in a single round trip.

use crate::config::types::{FieldKind, FieldRule};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Full validation: required fields must be present and non-null, and
/// every present field must satisfy its rule.
pub fn validate_document(
    doc: &Map<String, Value>,
    rules: &HashMap<String, FieldRule>,
) -> Vec<String> {
    let mut errors = Vec::new();
    let mut names: Vec<&String> = rules.keys().collect();
    names.sort();
    for name in names {
        let rule = &rules[name];
        match doc.get(name) {
            None | Some(Value::Null) => {
                if rule.required {
                    errors.push(format!("{name} is required"));
                }
            }
            Some(v) => validate_field(name, v, rule, &mut errors),
        }
    }
    errors
}

/// Partial validation for patches: only the fields present in the patch
/// are checked; `required` is not enforced for absent fields.
pub fn validate_partial(
    patch: &Map<String, Value>,
    rules: &HashMap<String, FieldRule>,
) -> Vec<String> {
    let mut errors = Vec::new();
    let mut names: Vec<&String> = patch.keys().collect();
    names.sort();
    for name in names {
        if let Some(rule) = rules.get(name) {
            match &patch[name] {
                Value::Null => {
                    if rule.required {
                        errors.push(format!("{name} is required"));
                    }
                }
                v => validate_field(name, v, rule, &mut errors),
            }
        }
    }
    errors
}

fn validate_field(name: &str, v: &Value, rule: &FieldRule, errors: &mut Vec<String>) {
    if let Some(kind) = rule.kind {
        if !kind_matches(kind, v) {
            errors.push(format!("{name} must be a {}", kind.type_name()));
            return;
        }
    }
    if let Some(max) = rule.max_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() > max as usize {
                errors.push(format!("{name} must be at most {max} characters"));
            }
        }
    }
    if let Some(min) = rule.min_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() < min as usize {
                errors.push(format!("{name} must be at least {min} characters"));
            }
        }
    }
    if let Some(pattern) = &rule.pattern {
        if let Some(s) = v.as_str() {
            match Regex::new(pattern) {
                Ok(re) if !re.is_match(s) => {
                    errors.push(format!("{name} does not match required pattern"))
                }
                Ok(_) => {}
                Err(_) => errors.push(format!("invalid pattern configured for {name}")),
            }
        }
    }
    if let Some(allowed) = &rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            errors.push(format!(
                "{name} must be one of: {}",
                allowed
                    .iter()
                    .take(8)
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
    }
    if let Some(min) = rule.minimum {
        if let Some(n) = v.as_f64() {
            if n < min {
                errors.push(format!("{name} must be at least {min}"));
            }
        }
    }
    if let Some(max) = rule.maximum {
        if let Some(n) = v.as_f64() {
            if n > max {
                errors.push(format!("{name} must be at most {max}"));
            }
        }
    }
}

fn kind_matches(kind: FieldKind, v: &Value) -> bool {
    match kind {
        FieldKind::String => v.is_string(),
        FieldKind::Int => v.as_i64().is_some(),
        FieldKind::Float => v.is_number(),
        FieldKind::Bool => v.is_boolean(),
        FieldKind::Object => v.is_object(),
        FieldKind::Array => v.is_array(),
    }
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}
