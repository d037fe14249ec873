//! One schema-validated document collection.
//!
//! Documents are JSON objects held behind a per-collection lock. Writes
//! validate before touching the data, unique rules are enforced on
//! every path, and bulk operations are unordered: one element failing
//! never blocks its siblings.

use crate::config::types::{CollectionConfig, FieldRule};
use crate::document::query::{matches_filter, sort_documents};
use crate::document::schema::{validate_document, validate_partial};
use crate::error::GatewayError;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::RwLock;

/// Why one element of a bulk insert was rejected.
#[derive(Debug)]
pub enum WriteFailure {
    Validation(Vec<String>),
    Duplicate(String),
    NotAnObject,
}

/// Outcome of an unordered bulk update.
#[derive(Debug, Default)]
pub struct BulkReport {
    pub matched: usize,
    pub modified: usize,
    /// Elements skipped without failing the batch (unknown id, unique
    /// conflict), with the reason.
    pub skipped: Vec<String>,
}

pub struct Collection {
    name: String,
    timestamps: bool,
    fields: HashMap<String, FieldRule>,
    docs: RwLock<Vec<Value>>,
}

impl Collection {
    pub fn new(config: &CollectionConfig) -> Self {
        Collection {
            name: config.name.clone(),
            timestamps: config.timestamps,
            fields: config.fields.clone(),
            docs: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &HashMap<String, FieldRule> {
        &self.fields
    }

    /// Insert one document: defaults, id and timestamps applied, full
    /// validation, unique rules.
    pub fn insert_one(&self, payload: &Value) -> Result<Value, GatewayError> {
        let mut docs = self.docs.write().expect("collection lock poisoned");
        match Self::prepare_and_insert(
            payload,
            &self.fields,
            self.timestamps,
            &mut docs,
        ) {
            Ok(doc) => Ok(doc),
            Err(WriteFailure::Validation(msgs)) => Err(GatewayError::Validation(msgs)),
            Err(WriteFailure::Duplicate(field)) => Err(GatewayError::Conflict(field)),
            Err(WriteFailure::NotAnObject) => Err(GatewayError::BadRequest(
                "document payload must be a JSON object".into(),
            )),
        }
    }

    /// Unordered bulk insert: every element is attempted; failures are
    /// reported per element and never roll back siblings.
    pub fn insert_many(&self, items: &[Value]) -> (Vec<Value>, Vec<WriteFailure>) {
        let mut docs = self.docs.write().expect("collection lock poisoned");
        let mut inserted = Vec::new();
        let mut failures = Vec::new();
        for item in items {
            match Self::prepare_and_insert(item, &self.fields, self.timestamps, &mut docs) {
                Ok(doc) => inserted.push(doc),
                Err(failure) => failures.push(failure),
            }
        }
        (inserted, failures)
    }

    /// Patch one document by id. The patch is validated field-by-field
    /// against the schema before anything is written.
    pub fn patch_by_id(&self, id: &Value, patch: &Map<String, Value>) -> Result<Value, GatewayError> {
        let errors = validate_partial(patch, &self.fields);
        if !errors.is_empty() {
            return Err(GatewayError::Validation(errors));
        }

        let mut docs = self.docs.write().expect("collection lock poisoned");
        let idx = docs
            .iter()
            .position(|d| id_matches(d, id))
            .ok_or_else(|| GatewayError::NotFound("document not found".into()))?;
        if let Some(field) = Self::unique_conflict(&docs, &self.fields, patch, Some(idx)) {
            return Err(GatewayError::Conflict(field));
        }

        let doc = docs[idx]
            .as_object_mut()
            .expect("stored documents are objects");
        for (k, v) in patch {
            doc.insert(k.clone(), v.clone());
        }
        if self.timestamps {
            doc.insert("updatedAt".into(), Value::String(Utc::now().to_rfc3339()));
        }
        Ok(docs[idx].clone())
    }

    /// Unordered update-by-id, no upsert: unknown ids and unique
    /// conflicts skip the element, siblings still apply. Schema
    /// validation does not run on this path, matching the bulk write
    /// semantics of the document driver convention.
    pub fn bulk_patch(&self, ops: &[(Value, Map<String, Value>)]) -> BulkReport {
        let mut docs = self.docs.write().expect("collection lock poisoned");
        let mut report = BulkReport::default();
        for (id, patch) in ops {
            let Some(idx) = docs.iter().position(|d| id_matches(d, id)) else {
                report.skipped.push(format!("no document with id {id}"));
                continue;
            };
            report.matched += 1;
            if let Some(field) = Self::unique_conflict(&docs, &self.fields, patch, Some(idx)) {
                report
                    .skipped
                    .push(format!("duplicate value in unique field '{field}'"));
                continue;
            }
            let doc = docs[idx]
                .as_object_mut()
                .expect("stored documents are objects");
            for (k, v) in patch {
                doc.insert(k.clone(), v.clone());
            }
            if self.timestamps {
                doc.insert("updatedAt".into(), Value::String(Utc::now().to_rfc3339()));
            }
            report.modified += 1;
        }
        report
    }

    pub fn find_matching(&self, filter: &Map<String, Value>) -> Vec<Value> {
        let docs = self.docs.read().expect("collection lock poisoned");
        docs.iter()
            .filter(|d| matches_filter(d, filter))
            .cloned()
            .collect()
    }

    pub fn count_matching(&self, filter: &Map<String, Value>) -> usize {
        let docs = self.docs.read().expect("collection lock poisoned");
        docs.iter().filter(|d| matches_filter(d, filter)).count()
    }

    /// Fetch documents whose `_id` is in `ids`, in collection order.
    pub fn find_by_ids(&self, ids: &[Value]) -> Vec<Value> {
        let docs = self.docs.read().expect("collection lock poisoned");
        docs.iter()
            .filter(|d| {
                ids.iter()
                    .any(|id| id_matches(d, id))
            })
            .cloned()
            .collect()
    }

    pub fn find_by_id(&self, id: &Value) -> Option<Value> {
        let docs = self.docs.read().expect("collection lock poisoned");
        docs.iter().find(|d| id_matches(d, id)).cloned()
    }

    /// Sorted snapshot of matches, for list reads.
    pub fn find_sorted(&self, filter: &Map<String, Value>, sort: &Map<String, Value>) -> Vec<Value> {
        let mut matched = self.find_matching(filter);
        sort_documents(&mut matched, sort);
        matched
    }

    fn prepare_and_insert(
        payload: &Value,
        fields: &HashMap<String, FieldRule>,
        timestamps: bool,
        docs: &mut Vec<Value>,
    ) -> Result<Value, WriteFailure> {
        let Some(obj) = payload.as_object() else {
            return Err(WriteFailure::NotAnObject);
        };
        let mut doc = obj.clone();

        for (name, rule) in fields {
            if let Some(default) = &rule.default {
                doc.entry(name.clone()).or_insert_with(|| default.clone());
            }
        }
        doc.entry("_id".to_string())
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
        if timestamps {
            let now = Value::String(Utc::now().to_rfc3339());
            doc.entry("createdAt".to_string()).or_insert_with(|| now.clone());
            doc.entry("updatedAt".to_string()).or_insert_with(|| now.clone());
        }

        let errors = validate_document(&doc, fields);
        if !errors.is_empty() {
            return Err(WriteFailure::Validation(errors));
        }
        if docs.iter().any(|d| id_matches(d, &doc["_id"])) {
            return Err(WriteFailure::Duplicate("_id".into()));
        }
        if let Some(field) = Self::unique_conflict(docs, fields, &doc, None) {
            return Err(WriteFailure::Duplicate(field));
        }

        let doc = Value::Object(doc);
        docs.push(doc.clone());
        Ok(doc)
    }

    /// First unique-field violation a candidate map would introduce,
    /// ignoring the document at `exclude` (the one being patched).
    fn unique_conflict(
        docs: &[Value],
        fields: &HashMap<String, FieldRule>,
        candidate: &Map<String, Value>,
        exclude: Option<usize>,
    ) -> Option<String> {
        for (name, rule) in fields {
            if !rule.unique {
                continue;
            }
            let Some(v) = candidate.get(name) else { continue };
            if v.is_null() {
                continue;
            }
            let clash = docs.iter().enumerate().any(|(i, d)| {
                Some(i) != exclude && d.get(name) == Some(v)
            });
            if clash {
                return Some(name.clone());
            }
        }
        None
    }
}

/// Loose id equality: values compare equal directly or through their
/// canonical string form, so `"7"` and `7` address the same document.
fn id_matches(doc: &Value, wanted: &Value) -> bool {
    match doc.get("_id") {
        Some(actual) => actual == wanted || id_text(actual) == id_text(wanted),
        None => false,
    }
}

fn id_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
