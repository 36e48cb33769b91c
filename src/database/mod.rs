// ABOUTME: PostgreSQL pool setup and the production query executor
// ABOUTME: Decodes arbitrary SELECT rows into JSON maps without compile-time row types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! # Database Layer
//!
//! Pool construction plus [`PgQueryExecutor`], the production implementation
//! of the pipeline's executor strategy. Proposed queries are dynamic text, so
//! rows are decoded column by column into JSON values: integers, numerics,
//! floats, booleans, text, timestamps, dates, and UUIDs all map to a display
//! representation; anything else decodes as null rather than failing the row.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::analytics::{DriverError, QueryExecutor, RowMap};
use crate::errors::{AppError, AppResult};

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect to the analytics database
///
/// # Errors
///
/// Returns a config error when the pool cannot be established.
pub async fn connect(database_url: &str) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
        .map_err(|e| {
            AppError::config("não foi possível conectar ao banco de dados").with_source(e)
        })?;
    info!(max_connections = MAX_CONNECTIONS, "pool de banco estabelecido");
    Ok(pool)
}

impl From<sqlx::Error> for DriverError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db) => Self {
                code: db.code().map(|code| code.into_owned()),
                message: db.message().to_owned(),
            },
            other => Self {
                code: None,
                message: other.to_string(),
            },
        }
    }
}

/// Production executor running validated statements on the pool
#[derive(Debug, Clone)]
pub struct PgQueryExecutor {
    pool: PgPool,
}

impl PgQueryExecutor {
    /// Wrap a pool in the executor strategy
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for PgQueryExecutor {
    async fn execute(&self, sql: &str) -> Result<Vec<RowMap>, DriverError> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(DriverError::from)?;
        debug!(rows = rows.len(), "consulta retornou");
        Ok(rows.iter().map(row_to_map).collect())
    }
}

fn row_to_map(row: &PgRow) -> RowMap {
    let mut map = RowMap::new();
    for (index, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_owned(), decode_column(row, index));
    }
    map
}

/// Decode one column into a JSON value, trying types from most to least common
fn decode_column(row: &PgRow, index: usize) -> Value {
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return value.map_or(Value::Null, Value::from);
    }
    if let Ok(value) = row.try_get::<Option<i32>, _>(index) {
        return value.map_or(Value::Null, Value::from);
    }
    // NUMERIC: aggregates like SUM/AVG over integer columns land here
    if let Ok(value) = row.try_get::<Option<Decimal>, _>(index) {
        return value
            .and_then(|decimal| decimal.to_f64())
            .map_or(Value::Null, Value::from);
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return value.map_or(Value::Null, Value::from);
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(index) {
        return value.map_or(Value::Null, Value::from);
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return value.map_or(Value::Null, Value::from);
    }
    if let Ok(value) = row.try_get::<Option<DateTime<Utc>>, _>(index) {
        return value.map_or(Value::Null, |ts| Value::from(ts.to_rfc3339()));
    }
    if let Ok(value) = row.try_get::<Option<NaiveDateTime>, _>(index) {
        return value.map_or(Value::Null, |ts| {
            Value::from(ts.format("%Y-%m-%dT%H:%M:%S").to_string())
        });
    }
    if let Ok(value) = row.try_get::<Option<NaiveDate>, _>(index) {
        return value.map_or(Value::Null, |date| {
            Value::from(date.format("%Y-%m-%d").to_string())
        });
    }
    if let Ok(value) = row.try_get::<Option<Uuid>, _>(index) {
        return value.map_or(Value::Null, |id| Value::from(id.to_string()));
    }
    Value::Null
}
