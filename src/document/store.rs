//! Collection registry and the document-side operations.
//!
//! The store is built once at startup from config and shared read-only;
//! each collection guards its own data. Operation semantics mirror the
//! legacy surface: list with optional pagination/sort/projection/
//! populate, unordered bulk insert, patch-by-id with re-validation, and
//! unordered bulk update that returns the documents re-fetched.

use crate::config::types::CollectionConfig;
use crate::document::collection::{Collection, WriteFailure};
use crate::document::query::{apply_select, populate_fields, ListOptions};
use crate::error::GatewayError;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct DocumentStore {
    collections: Arc<HashMap<String, Collection>>,
}

impl DocumentStore {
    pub fn from_config(specs: &[CollectionConfig]) -> Self {
        let collections = specs
            .iter()
            .map(|spec| (spec.name.clone(), Collection::new(spec)))
            .collect();
        DocumentStore {
            collections: Arc::new(collections),
        }
    }

    pub fn collection(&self, name: &str) -> Result<&Collection, GatewayError> {
        self.collections
            .get(name)
            .ok_or_else(|| GatewayError::NotFound(format!("model '{name}' not found")))
    }

    /// List documents matching a field-constraint filter. When both
    /// `page` and `limit` are set the result is wrapped with pagination
    /// metadata; otherwise the plain array is returned.
    pub fn list(
        &self,
        name: &str,
        filter: &Value,
        options: &ListOptions,
    ) -> Result<Value, GatewayError> {
        let coll = self.collection(name)?;
        let filter = filter_object(filter)?;

        let default_sort: Map<String, Value> =
            [("createdAt".to_string(), json!(-1))].into_iter().collect();
        let sort = options.sort.as_ref().unwrap_or(&default_sort);
        let mut matched = coll.find_sorted(&filter, sort);

        let pagination = match (options.page, options.limit) {
            (Some(page), Some(limit)) if limit > 0 => {
                let total = matched.len() as u64;
                let page = page.max(1);
                let skip = ((page - 1) * limit) as usize;
                matched = matched.into_iter().skip(skip).take(limit as usize).collect();
                Some(json!({
                    "page": page,
                    "limit": limit,
                    "total": total,
                    "pages": total.div_ceil(limit),
                }))
            }
            _ => None,
        };

        if let Some(spec) = &options.populate {
            self.populate(coll, &mut matched, spec);
        }
        if let Some(select) = &options.select {
            matched = matched.iter().map(|d| apply_select(d, select)).collect();
        }

        Ok(match pagination {
            Some(pagination) => json!({ "data": matched, "pagination": pagination }),
            None => Value::Array(matched),
        })
    }

    /// Insert one document or an unordered batch. Batch failures never
    /// roll back siblings; whatever inserted stays, and the error names
    /// the partial outcome.
    pub fn create(&self, name: &str, payload: &Value) -> Result<Value, GatewayError> {
        let coll = self.collection(name)?;
        match payload {
            Value::Array(items) => {
                let (inserted, failures) = coll.insert_many(items);
                if failures.is_empty() {
                    return Ok(Value::Array(inserted));
                }
                tracing::warn!(
                    collection = name,
                    inserted = inserted.len(),
                    failed = failures.len(),
                    "bulk insert completed partially"
                );
                if let Some(field) = failures.iter().find_map(|f| match f {
                    WriteFailure::Duplicate(field) => Some(field.clone()),
                    _ => None,
                }) {
                    return Err(GatewayError::Conflict(field));
                }
                let mut messages = Vec::new();
                if !inserted.is_empty() {
                    messages.push(format!(
                        "inserted {} of {} documents",
                        inserted.len(),
                        items.len()
                    ));
                }
                for failure in failures {
                    match failure {
                        WriteFailure::Validation(msgs) => messages.extend(msgs),
                        WriteFailure::NotAnObject => {
                            messages.push("element must be a JSON object".into())
                        }
                        WriteFailure::Duplicate(_) => unreachable!("handled above"),
                    }
                }
                Err(GatewayError::Validation(messages))
            }
            // Single insert, wrapped as a one-element array so both
            // paths answer the same shape.
            Value::Object(_) => Ok(Value::Array(vec![coll.insert_one(payload)?])),
            _ => Err(GatewayError::BadRequest(
                "document payload must be an object or an array of objects".into(),
            )),
        }
    }

    /// Patch one document or an unordered batch by identifier. Each
    /// element must carry `_id` or `id`; for batches that is checked for
    /// every element before any write is issued. Batches answer the
    /// affected documents re-fetched, not the caller's stale copies.
    pub fn update(&self, name: &str, payload: &Value) -> Result<Value, GatewayError> {
        let coll = self.collection(name)?;
        match payload {
            Value::Object(obj) => {
                let (id, patch) = split_identifier(obj)?;
                let doc = coll.patch_by_id(&id, &patch)?;
                Ok(json!({ "message": "operation completed successfully", "data": doc }))
            }
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(GatewayError::BadRequest("empty update array".into()));
                }
                // All identifiers are checked before the first write so a
                // malformed element cannot leave the batch half-applied.
                let mut ops = Vec::with_capacity(items.len());
                for item in items {
                    let obj = item.as_object().ok_or_else(|| {
                        GatewayError::BadRequest(
                            "each array element must be a JSON object".into(),
                        )
                    })?;
                    ops.push(split_identifier(obj)?);
                }
                let ids: Vec<Value> = ops.iter().map(|(id, _)| id.clone()).collect();
                let report = coll.bulk_patch(&ops);
                if !report.skipped.is_empty() {
                    tracing::warn!(
                        collection = name,
                        skipped = ?report.skipped,
                        "bulk update skipped elements"
                    );
                }
                let fresh = coll.find_by_ids(&ids);
                Ok(json!({ "message": "operation completed successfully", "data": fresh }))
            }
            _ => Err(GatewayError::BadRequest(
                "update payload must be an object or an array of objects".into(),
            )),
        }
    }

    /// Replace reference ids with the referenced documents, for each
    /// populate field whose rule names a reference collection. Unknown
    /// ids populate as null.
    fn populate(&self, coll: &Collection, docs: &mut [Value], spec: &Value) {
        for field in populate_fields(spec) {
            let Some(reference) = coll
                .fields()
                .get(&field)
                .and_then(|rule| rule.reference.as_ref())
            else {
                continue;
            };
            let Some(target) = self.collections.get(reference) else {
                continue;
            };
            for doc in docs.iter_mut() {
                let Some(obj) = doc.as_object_mut() else { continue };
                let Some(current) = obj.get(&field).cloned() else {
                    continue;
                };
                let expanded = match current {
                    Value::Array(ids) => Value::Array(
                        ids.iter()
                            .map(|id| target.find_by_id(id).unwrap_or(Value::Null))
                            .collect(),
                    ),
                    id => target.find_by_id(&id).unwrap_or(Value::Null),
                };
                obj.insert(field.clone(), expanded);
            }
        }
    }
}

fn filter_object(filter: &Value) -> Result<Map<String, Value>, GatewayError> {
    match filter {
        Value::Null => Ok(Map::new()),
        Value::Object(obj) => Ok(obj.clone()),
        _ => Err(GatewayError::BadRequest(
            "document filter must be a JSON object".into(),
        )),
    }
}

/// Pull `_id`/`id` out of an update element; both keys are stripped
/// from the patch body. `_id` wins when both are present.
fn split_identifier(obj: &Map<String, Value>) -> Result<(Value, Map<String, Value>), GatewayError> {
    let id = obj
        .get("_id")
        .or_else(|| obj.get("id"))
        .filter(|v| !v.is_null())
        .cloned()
        .ok_or_else(|| {
            GatewayError::BadRequest("each element must carry '_id' or 'id'".into())
        })?;
    let patch = obj
        .iter()
        .filter(|(k, _)| k.as_str() != "_id" && k.as_str() != "id")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Ok((id, patch))
}
