//! Query requests and JSON result rows
//!
//! A [`QueryRequest`] is validated at construction: the highest `$n`
//! placeholder in the SQL must equal the number of bound parameters.
//! Values are always bound through sqlx, never spliced into the SQL text.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::postgres::types::{PgInterval, PgTimeTz};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::types::BigDecimal;
use sqlx::{Column, Postgres, Row, TypeInfo, ValueRef};
use uuid::Uuid;

use super::DbError;

/// One row: column name to value, in the column order the engine returned
pub type JsonRow = serde_json::Map<String, Value>;

/// Positional parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Bool(bool),
    Int(i32),
    BigInt(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        Self::BigInt(v)
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// SQL template plus ordered positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    sql: String,
    params: Vec<SqlParam>,
}

impl QueryRequest {
    /// Build a request, rejecting a parameter count that does not match the
    /// statement's placeholders.
    pub fn new(sql: impl Into<String>, params: Vec<SqlParam>) -> Result<Self, DbError> {
        let sql = sql.into();
        let expected = max_placeholder(&sql);
        if expected != params.len() {
            return Err(DbError::ParameterMismatch {
                expected,
                actual: params.len(),
            });
        }
        Ok(Self { sql, params })
    }

    /// Build a request without parameters.
    pub fn simple(sql: impl Into<String>) -> Result<Self, DbError> {
        Self::new(sql, Vec::new())
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    /// sqlx query with every parameter bound in order.
    pub(crate) fn to_query(&self) -> Query<'_, Postgres, PgArguments> {
        self.params
            .iter()
            .fold(sqlx::query(&self.sql), |query, param| match param {
                SqlParam::Bool(v) => query.bind(*v),
                SqlParam::Int(v) => query.bind(*v),
                SqlParam::BigInt(v) => query.bind(*v),
                SqlParam::Float(v) => query.bind(*v),
                SqlParam::Text(v) => query.bind(v.as_str()),
            })
    }
}

/// Highest `$n` placeholder outside string literals, quoted identifiers,
/// comments and dollar-quoted bodies. Zero when there are none.
fn max_placeholder(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut max = 0;
    let mut i = 0;

    while i < len {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                // A doubled quote closes and reopens, which lands in the same place.
                i += 1;
                while i < len && bytes[i] != quote {
                    i += 1;
                }
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = match sql[i + 2..].find("*/") {
                    Some(offset) => i + 2 + offset + 2,
                    None => len,
                };
            }
            b'$' => {
                let start = i + 1;
                let mut j = start;
                while j < len && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                if j > start {
                    let n = sql[start..j].parse::<usize>().unwrap_or(usize::MAX);
                    max = max.max(n);
                    i = j;
                    continue;
                }

                while j < len && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
                    j += 1;
                }
                if j < len && bytes[j] == b'$' {
                    let tag = &sql[i..=j];
                    i = match sql[j + 1..].find(tag) {
                        Some(offset) => j + 1 + offset + tag.len(),
                        None => len,
                    };
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }

    max
}

/// Ordered rows of a finished query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QueryResult {
    rows: Vec<JsonRow>,
}

impl QueryResult {
    pub(crate) fn from_rows(rows: &[PgRow]) -> Self {
        Self {
            rows: rows.iter().map(row_to_json).collect(),
        }
    }

    pub fn rows(&self) -> &[JsonRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row, if the query produced any.
    pub fn into_first(self) -> Option<JsonRow> {
        self.rows.into_iter().next()
    }
}

impl From<Vec<JsonRow>> for QueryResult {
    fn from(rows: Vec<JsonRow>) -> Self {
        Self { rows }
    }
}

fn row_to_json(row: &PgRow) -> JsonRow {
    row.columns()
        .iter()
        .map(|column| {
            let value = column_value(row, column.ordinal(), column.type_info().name());
            (column.name().to_owned(), value)
        })
        .collect()
}

fn column_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    match row.try_get_raw(index) {
        Ok(raw) if !raw.is_null() => {}
        _ => return Value::Null,
    }

    let decoded = match type_name {
        "BOOL" => row.try_get::<bool, _>(index).map(Value::from),
        "INT2" => row.try_get::<i16, _>(index).map(Value::from),
        "INT4" => row.try_get::<i32, _>(index).map(Value::from),
        "INT8" => row.try_get::<i64, _>(index).map(Value::from),
        "FLOAT4" => row.try_get::<f32, _>(index).map(|v| Value::from(f64::from(v))),
        "FLOAT8" => row.try_get::<f64, _>(index).map(Value::from),
        // Arbitrary precision: a string, so no digits are lost to f64.
        "NUMERIC" => row
            .try_get::<BigDecimal, _>(index)
            .map(|v| Value::from(v.to_string())),
        // sqlx reports bpchar as CHAR, and the one-byte "char" type quoted.
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" | "CITEXT" => {
            row.try_get::<String, _>(index).map(Value::from)
        }
        "\"CHAR\"" => row
            .try_get::<i8, _>(index)
            .map(|v| Value::from(char::from(v as u8).to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<DateTime<Utc>, _>(index)
            .map(|v| Value::from(v.to_rfc3339_opts(SecondsFormat::Millis, true))),
        "TIMESTAMP" => row
            .try_get::<NaiveDateTime, _>(index)
            .map(|v| Value::from(v.format("%Y-%m-%dT%H:%M:%S%.3f").to_string())),
        "DATE" => row.try_get::<NaiveDate, _>(index).map(|v| Value::from(v.to_string())),
        "TIME" => row.try_get::<NaiveTime, _>(index).map(|v| Value::from(v.to_string())),
        "TIMETZ" => row
            .try_get::<PgTimeTz<NaiveTime, FixedOffset>, _>(index)
            .map(|v| Value::from(format!("{}{}", v.time, v.offset))),
        "INTERVAL" => row.try_get::<PgInterval, _>(index).map(|v| {
            json!({
                "months": v.months,
                "days": v.days,
                "microseconds": v.microseconds,
            })
        }),
        "UUID" => row.try_get::<Uuid, _>(index).map(|v| Value::from(v.to_string())),
        "JSON" | "JSONB" => row.try_get::<Value, _>(index),
        "BOOL[]" => row.try_get::<Vec<Option<bool>>, _>(index).map(Value::from),
        "INT2[]" => row.try_get::<Vec<Option<i16>>, _>(index).map(Value::from),
        "INT4[]" => row.try_get::<Vec<Option<i32>>, _>(index).map(Value::from),
        "INT8[]" => row.try_get::<Vec<Option<i64>>, _>(index).map(Value::from),
        "FLOAT4[]" => row.try_get::<Vec<Option<f32>>, _>(index).map(Value::from),
        "FLOAT8[]" => row.try_get::<Vec<Option<f64>>, _>(index).map(Value::from),
        "NUMERIC[]" => row.try_get::<Vec<Option<BigDecimal>>, _>(index).map(|values| {
            values
                .into_iter()
                .map(|v| v.map_or(Value::Null, |v| Value::from(v.to_string())))
                .collect()
        }),
        "TEXT[]" | "VARCHAR[]" | "CHAR[]" | "NAME[]" => {
            row.try_get::<Vec<Option<String>>, _>(index).map(Value::from)
        }
        other => {
            tracing::debug!(column = index, type_name = other, "unsupported column type, rendering null");
            return Value::Null;
        }
    };

    decoded.unwrap_or_else(|err| {
        tracing::warn!(column = index, type_name, "failed to decode column: {}", err);
        Value::Null
    })
}
