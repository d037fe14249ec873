//! Row decoding and the truthiness discriminant.
//!
//! Stored functions report business failure through their return shape,
//! not through SQL errors: the first column of the first row is the
//! success discriminant. That cell must be read in wire order, before
//! any map-based reshaping loses column positions.

use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row};

/// Decode a whole row into a JSON object, column by column.
pub fn row_to_json(row: &PgRow) -> Value {
    let mut map = serde_json::Map::new();
    for (idx, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), cell_to_value(row, idx));
    }
    Value::Object(map)
}

/// First column of the row, by ordinal.
pub fn first_cell(row: &PgRow) -> Value {
    if row.columns().is_empty() {
        return Value::Null;
    }
    cell_to_value(row, 0)
}

/// Decode one cell to JSON by trying the types the stored functions
/// return. Anything undecodable comes back as null rather than erroring
/// the whole row.
fn cell_to_value(row: &PgRow, idx: usize) -> Value {
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(idx) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(idx) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(idx) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(idx) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(idx) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(idx) {
        return j;
    }
    Value::Null
}

/// Truthiness the way the calling convention defines it: null, false,
/// zero and the empty string are falsy; arrays and objects (even empty
/// ones) are truthy.
pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Success discriminant over the first cell of the first returned row.
/// An empty result set is a failure.
pub fn outcome_confirmed(first_cell: Option<&Value>) -> bool {
    first_cell.map(is_truthy).unwrap_or(false)
}
