//! Decoding PostgreSQL rows into opaque JSON rows

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

use crate::errors::DataAccessError;
use crate::record_set::Row;

/// Decode every column of a row, keyed by column name
pub fn decode_row(row: &PgRow) -> Result<Row, DataAccessError> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.name(), column.type_info().name())?;
        decoded.insert(column.name().to_string(), value);
    }
    Ok(decoded)
}

pub fn decode_rows(rows: &[PgRow]) -> Result<Vec<Row>, DataAccessError> {
    rows.iter().map(decode_row).collect()
}

/// Whether a result is a list of cursors, one per result set
pub fn is_cursor_result(rows: &[PgRow]) -> bool {
    rows.first().is_some_and(|row| {
        let columns = row.columns();
        columns.len() == 1 && columns[0].type_info().name().eq_ignore_ascii_case("REFCURSOR")
    })
}

/// Cursor names from a `SETOF refcursor` result
pub fn cursor_names(rows: &[PgRow]) -> Result<Vec<String>, DataAccessError> {
    rows.iter()
        .map(|row| Ok(row.try_get_unchecked::<String, _>(0)?))
        .collect()
}

fn float_value(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn decode_column(
    row: &PgRow,
    index: usize,
    column: &str,
    type_name: &str,
) -> Result<Value, DataAccessError> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }

    let value = match type_name.to_ascii_uppercase().as_str() {
        "BOOL" => Value::Bool(row.try_get::<bool, _>(index)?),
        "INT2" => Value::from(row.try_get::<i16, _>(index)?),
        "INT4" => Value::from(row.try_get::<i32, _>(index)?),
        "INT8" => Value::from(row.try_get::<i64, _>(index)?),
        "FLOAT4" => float_value(f64::from(row.try_get::<f32, _>(index)?)),
        "FLOAT8" => float_value(row.try_get::<f64, _>(index)?),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" | "REFCURSOR" | "UNKNOWN" => {
            Value::String(row.try_get_unchecked::<String, _>(index)?)
        }
        "UUID" => Value::String(row.try_get::<uuid::Uuid, _>(index)?.to_string()),
        "JSON" | "JSONB" => row.try_get::<Value, _>(index)?,
        "TIMESTAMPTZ" => Value::String(
            row.try_get::<DateTime<Utc>, _>(index)?
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
        "TIMESTAMP" => Value::String(
            row.try_get::<NaiveDateTime, _>(index)?
                .format("%Y-%m-%dT%H:%M:%S%.3f")
                .to_string(),
        ),
        "DATE" => Value::String(row.try_get::<NaiveDate, _>(index)?.to_string()),
        "TEXT[]" | "VARCHAR[]" => Value::from(row.try_get::<Vec<String>, _>(index)?),
        "INT4[]" => Value::from(row.try_get::<Vec<i32>, _>(index)?),
        "INT8[]" => Value::from(row.try_get::<Vec<i64>, _>(index)?),
        "VOID" => Value::Null,
        other => {
            return Err(DataAccessError::UnsupportedColumnType {
                column: column.to_string(),
                type_name: other.to_string(),
            })
        }
    };

    Ok(value)
}
