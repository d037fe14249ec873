//! Stored-function invocation against PostgreSQL.
//!
//! Every operation is one call shape: `SELECT * FROM public."fx"($1::jsonb)`.
//! The function name comes from the validated routing table only; the
//! caller payload is always a bound parameter, never interpolated into
//! the statement text.

use crate::error::GatewayError;
use crate::relational::row::{first_cell, outcome_confirmed, row_to_json};
use serde_json::{json, Value};
use sqlx::postgres::PgRow;
use sqlx::PgPool;

pub struct RelationalExecutor;

impl RelationalExecutor {
    /// Invoke the function with a filter payload and return all rows
    /// verbatim. Pagination, sorting and projection are the function's
    /// own business.
    pub async fn list(
        pool: &PgPool,
        function: &str,
        filter: &Value,
    ) -> Result<Value, GatewayError> {
        let rows = Self::call(pool, function, filter).await?;
        Ok(Value::Array(rows.iter().map(row_to_json).collect()))
    }

    /// Invoke the insert function. The function may run without a SQL
    /// error yet fail its own business validation, signalled by a falsy
    /// first cell; that case is a logical failure with the raw result
    /// echoed for diagnostics.
    pub async fn create(
        pool: &PgPool,
        function: &str,
        payload: &Value,
    ) -> Result<Value, GatewayError> {
        let rows = Self::call(pool, function, payload).await?;
        let confirmed = outcome_confirmed(rows.first().map(first_cell).as_ref());
        let data: Vec<Value> = rows.iter().map(row_to_json).collect();
        if confirmed {
            Ok(Value::Array(data))
        } else {
            Err(GatewayError::Logical(format!(
                "could not register: {}",
                echo(&data)
            )))
        }
    }

    /// Invoke the update function. Same discriminant as `create`; on
    /// success only a confirmation message is returned, the function's
    /// side effects are trusted and not re-read.
    pub async fn update(
        pool: &PgPool,
        function: &str,
        payload: &Value,
    ) -> Result<Value, GatewayError> {
        let rows = Self::call(pool, function, payload).await?;
        let confirmed = outcome_confirmed(rows.first().map(first_cell).as_ref());
        if confirmed {
            Ok(json!({ "message": "operation completed successfully" }))
        } else {
            let data: Vec<Value> = rows.iter().map(row_to_json).collect();
            Err(GatewayError::Logical(format!(
                "could not update: {}",
                echo(&data)
            )))
        }
    }

    async fn call(pool: &PgPool, function: &str, payload: &Value) -> Result<Vec<PgRow>, GatewayError> {
        // Identifier shape is enforced at startup; quoting guards the rest.
        let sql = format!(
            "SELECT * FROM public.\"{}\"($1::jsonb)",
            function.replace('"', "\"\"")
        );
        tracing::debug!(sql = %sql, payload = %payload, "stored function call");
        let rows = sqlx::query(&sql).bind(payload).fetch_all(pool).await?;
        Ok(rows)
    }
}

fn echo(rows: &[Value]) -> String {
    serde_json::to_string(rows).unwrap_or_else(|_| "[]".into())
}
