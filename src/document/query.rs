//! Filter matching, ordering, projection and list options for the
//! document backend.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Read options accepted by `list`. Pagination applies only when both
/// `page` and `limit` are present.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListOptions {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    /// Field -> direction; negative means descending.
    #[serde(default)]
    pub sort: Option<Map<String, Value>>,
    /// Projection: object of field -> 0/1, or array of field names.
    #[serde(default)]
    pub select: Option<Value>,
    /// Reference expansion: field name or array of field names.
    #[serde(default)]
    pub populate: Option<Value>,
}

/// Match one document against a field-constraint object. A scalar
/// constraint means equality; an object whose keys start with `$` is an
/// operator set.
pub fn matches_filter(doc: &Value, filter: &Map<String, Value>) -> bool {
    filter
        .iter()
        .all(|(field, constraint)| matches_constraint(doc.get(field), constraint))
}

fn matches_constraint(field_value: Option<&Value>, constraint: &Value) -> bool {
    match constraint {
        Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => {
            ops.iter().all(|(op, rhs)| {
                apply_operator(field_value, op, rhs)
            })
        }
        other => field_value == Some(other),
    }
}

fn apply_operator(lhs: Option<&Value>, op: &str, rhs: &Value) -> bool {
    match op {
        "$exists" => {
            let wanted = rhs.as_bool().unwrap_or(true);
            lhs.is_some() == wanted
        }
        "$eq" => lhs == Some(rhs),
        "$ne" => lhs != Some(rhs),
        "$in" => match (lhs, rhs.as_array()) {
            (Some(v), Some(list)) => list.contains(v),
            _ => false,
        },
        "$nin" => match (lhs, rhs.as_array()) {
            (Some(v), Some(list)) => !list.contains(v),
            (None, Some(_)) => true,
            _ => false,
        },
        "$gt" | "$gte" | "$lt" | "$lte" => {
            let Some(v) = lhs else { return false };
            let Some(ord) = compare_values(v, rhs) else {
                return false;
            };
            match op {
                "$gt" => ord == Ordering::Greater,
                "$gte" => ord != Ordering::Less,
                "$lt" => ord == Ordering::Less,
                _ => ord != Ordering::Greater,
            }
        }
        // Unknown operators match nothing rather than everything.
        _ => false,
    }
}

/// Ordering between two JSON values of the same family; `None` when the
/// comparison makes no sense (mixed families).
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Sort documents by the given keys, in key order. Missing fields rank
/// as null, which sorts before every concrete value; mixed-family
/// values rank by a fixed family order so the result is deterministic.
pub fn sort_documents(docs: &mut [Value], sort: &Map<String, Value>) {
    docs.sort_by(|a, b| {
        for (field, direction) in sort {
            let av = a.get(field).unwrap_or(&Value::Null);
            let bv = b.get(field).unwrap_or(&Value::Null);
            let ord = total_order(av, bv);
            if ord != Ordering::Equal {
                let descending = direction.as_f64().map(|d| d < 0.0).unwrap_or(false);
                return if descending { ord.reverse() } else { ord };
            }
        }
        Ordering::Equal
    });
}

fn total_order(a: &Value, b: &Value) -> Ordering {
    compare_values(a, b).unwrap_or_else(|| family_rank(a).cmp(&family_rank(b)))
}

fn family_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Apply a projection. `_id` is always kept. An object projection with
/// any `1` value is inclusive; all-`0` values mean exclusion. An array
/// projection is inclusive.
pub fn apply_select(doc: &Value, select: &Value) -> Value {
    let Some(obj) = doc.as_object() else {
        return doc.clone();
    };
    let kept: Map<String, Value> = match select {
        Value::Array(names) => {
            let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
            obj.iter()
                .filter(|(k, _)| k.as_str() == "_id" || names.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        }
        Value::Object(spec) => {
            let inclusive = spec.values().any(|v| v.as_f64().unwrap_or(0.0) != 0.0);
            obj.iter()
                .filter(|(k, _)| {
                    if k.as_str() == "_id" {
                        return true;
                    }
                    let flagged = spec
                        .get(k.as_str())
                        .map(|v| v.as_f64().unwrap_or(0.0) != 0.0);
                    match (inclusive, flagged) {
                        (true, Some(true)) => true,
                        (true, _) => false,
                        (false, Some(false)) => false,
                        (false, _) => true,
                    }
                })
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        }
        _ => return doc.clone(),
    };
    Value::Object(kept)
}

/// Normalize a populate spec to the list of field names to expand.
pub fn populate_fields(populate: &Value) -> Vec<String> {
    match populate {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn scalar_constraints_mean_equality() {
        let doc = json!({ "name": "Acme", "company_id": 3 });
        assert!(matches_filter(&doc, &filter(json!({ "name": "Acme" }))));
        assert!(matches_filter(&doc, &filter(json!({ "company_id": 3 }))));
        assert!(!matches_filter(&doc, &filter(json!({ "name": "Other" }))));
        assert!(!matches_filter(&doc, &filter(json!({ "missing": 1 }))));
    }

    #[test]
    fn operator_constraints() {
        let doc = json!({ "quantity": 5, "status": 13 });
        assert!(matches_filter(&doc, &filter(json!({ "quantity": { "$gte": 5 } }))));
        assert!(matches_filter(&doc, &filter(json!({ "quantity": { "$gt": 4, "$lt": 6 } }))));
        assert!(!matches_filter(&doc, &filter(json!({ "quantity": { "$lt": 5 } }))));
        assert!(matches_filter(&doc, &filter(json!({ "status": { "$in": [12, 13] } }))));
        assert!(matches_filter(&doc, &filter(json!({ "status": { "$ne": 14 } }))));
        assert!(matches_filter(&doc, &filter(json!({ "gone": { "$exists": false } }))));
        assert!(!matches_filter(&doc, &filter(json!({ "quantity": { "$regex": "x" } }))));
    }

    #[test]
    fn sorts_descending_with_missing_fields_ranked_as_null() {
        let mut docs = vec![
            json!({ "createdAt": "2026-01-02" }),
            json!({}),
            json!({ "createdAt": "2026-01-03" }),
            json!({ "createdAt": "2026-01-01" }),
        ];
        sort_documents(&mut docs, &filter(json!({ "createdAt": -1 })));
        let keys: Vec<Option<&str>> = docs
            .iter()
            .map(|d| d.get("createdAt").and_then(Value::as_str))
            .collect();
        assert_eq!(
            keys,
            vec![Some("2026-01-03"), Some("2026-01-02"), Some("2026-01-01"), None]
        );
    }

    #[test]
    fn projection_keeps_id_either_way() {
        let doc = json!({ "_id": "a", "name": "x", "secret": "s" });
        let included = apply_select(&doc, &json!({ "name": 1 }));
        assert_eq!(included, json!({ "_id": "a", "name": "x" }));
        let excluded = apply_select(&doc, &json!({ "secret": 0 }));
        assert_eq!(excluded, json!({ "_id": "a", "name": "x" }));
        let listed = apply_select(&doc, &json!(["secret"]));
        assert_eq!(listed, json!({ "_id": "a", "secret": "s" }));
    }
}
