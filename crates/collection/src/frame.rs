//! Conversion between validated records and polars frames.

use crate::error::SourceError;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use core_types::{ISO_DATE, ISO_DATETIME, RawRecord, Record, Value};
use polars::prelude::*;
use schema::{Field, FieldKind, Schema};
use serde_json::{Number, Value as JsonValue};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

// `NaiveDate::default()` is 1970-01-01.
fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn date_to_days(date: &NaiveDate) -> i32 {
    date.signed_duration_since(epoch()).num_days() as i32
}

fn days_to_date(days: i32) -> Option<NaiveDate> {
    epoch().checked_add_signed(Duration::days(i64::from(days)))
}

fn datetime_to_nanos(dt: &NaiveDateTime) -> Option<i64> {
    dt.and_utc().timestamp_nanos_opt()
}

fn ticks_to_datetime(ticks: i64, unit: &TimeUnit) -> Option<NaiveDateTime> {
    let nanos_per_tick = match unit {
        TimeUnit::Nanoseconds => 1,
        TimeUnit::Microseconds => 1_000,
        TimeUnit::Milliseconds => 1_000_000,
    };
    let ticks_per_second = NANOS_PER_SECOND / nanos_per_tick;
    let secs = ticks.div_euclid(ticks_per_second);
    let nanos = ticks.rem_euclid(ticks_per_second) * nanos_per_tick;
    DateTime::from_timestamp(secs, nanos as u32).map(|dt| dt.naive_utc())
}

/// Builds one typed column for `field`. Absent and null values become nulls.
fn column_for(field: &Field, records: &[Record]) -> PolarsResult<Series> {
    let name = field.name();
    let cells = records.iter().map(|r| r.get(name).filter(|v| !v.is_null()));

    let series = match field.kind() {
        FieldKind::Integer => {
            let values: Vec<Option<i64>> = cells
                .map(|v| match v {
                    Some(Value::Int(i)) => Some(*i),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        FieldKind::Float | FieldKind::Decimal => {
            let values: Vec<Option<f64>> = cells.map(|v| v.and_then(Value::as_f64)).collect();
            Series::new(name, values)
        }
        FieldKind::Str => {
            let values: Vec<Option<&str>> = cells.map(|v| v.and_then(Value::as_str)).collect();
            Series::new(name, values)
        }
        FieldKind::Bool => {
            let values: Vec<Option<bool>> = cells
                .map(|v| match v {
                    Some(Value::Bool(b)) => Some(*b),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        FieldKind::Date { .. } => {
            let values: Vec<Option<i32>> = cells
                .map(|v| match v {
                    Some(Value::Date(d)) => Some(date_to_days(d)),
                    _ => None,
                })
                .collect();
            Series::new(name, values).cast(&DataType::Date)?
        }
        FieldKind::DateTime { .. } => {
            let values: Vec<Option<i64>> = cells
                .map(|v| match v {
                    Some(Value::DateTime(dt)) => datetime_to_nanos(dt),
                    _ => None,
                })
                .collect();
            Series::new(name, values).cast(&DataType::Datetime(TimeUnit::Nanoseconds, None))?
        }
        kind => {
            let values: Vec<Option<String>> = cells
                .map(|v| v.map(|v| kind.render(v).to_string()))
                .collect();
            Series::new(name, values)
        }
    };
    Ok(series)
}

/// Builds a frame with one column per schema field, in declaration order.
pub fn records_to_frame(schema: &Schema, records: &[Record]) -> PolarsResult<DataFrame> {
    let columns = schema
        .fields()
        .iter()
        .map(|field| column_for(field, records))
        .collect::<PolarsResult<Vec<_>>>()?;
    DataFrame::new(columns)
}

fn render_date(date: NaiveDate, kind: &FieldKind) -> JsonValue {
    let text = match kind {
        FieldKind::Date { format } => date.format(format).to_string(),
        FieldKind::DateTime { format } => date.and_time(Default::default()).format(format).to_string(),
        _ => date.format(ISO_DATE).to_string(),
    };
    JsonValue::String(text)
}

fn render_datetime(dt: NaiveDateTime, kind: &FieldKind) -> JsonValue {
    let text = match kind {
        FieldKind::DateTime { format } => dt.format(format).to_string(),
        FieldKind::Date { format } => dt.date().format(format).to_string(),
        _ => dt.format(ISO_DATETIME).to_string(),
    };
    JsonValue::String(text)
}

fn string_cells(series: &Series, kind: &FieldKind) -> PolarsResult<Vec<JsonValue>> {
    Ok(series
        .str()?
        .into_iter()
        .map(|cell| match cell {
            Some(text) if kind.is_container() => serde_json::from_str(text)
                .unwrap_or_else(|_| JsonValue::String(text.to_string())),
            Some(text) => JsonValue::String(text.to_string()),
            None => JsonValue::Null,
        })
        .collect())
}

/// Reads one frame column as JSON cells the field's kind will accept.
fn column_cells(series: &Series, kind: &FieldKind) -> PolarsResult<Vec<JsonValue>> {
    let cells = match series.dtype() {
        dtype if matches!(kind, FieldKind::Str) && (dtype.is_numeric() || matches!(dtype, DataType::Boolean)) => {
            let cast = series.cast(&DataType::String)?;
            string_cells(&cast, kind)?
        }
        DataType::Boolean => series
            .bool()?
            .into_iter()
            .map(|v| v.map(JsonValue::Bool).unwrap_or(JsonValue::Null))
            .collect(),
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => {
            let cast = series.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map(JsonValue::from).unwrap_or(JsonValue::Null))
                .collect()
        }
        DataType::Float32 | DataType::Float64 => {
            let cast = series.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| {
                    v.and_then(Number::from_f64)
                        .map(JsonValue::Number)
                        .unwrap_or(JsonValue::Null)
                })
                .collect()
        }
        DataType::String => string_cells(series, kind)?,
        DataType::Date => {
            let cast = series.cast(&DataType::Int32)?;
            cast.i32()?
                .into_iter()
                .map(|v| {
                    v.and_then(days_to_date)
                        .map(|d| render_date(d, kind))
                        .unwrap_or(JsonValue::Null)
                })
                .collect()
        }
        DataType::Datetime(unit, _) => {
            let cast = series.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| {
                    v.and_then(|ticks| ticks_to_datetime(ticks, unit))
                        .map(|dt| render_datetime(dt, kind))
                        .unwrap_or(JsonValue::Null)
                })
                .collect()
        }
        DataType::Null => vec![JsonValue::Null; series.len()],
        _ => {
            let cast = series.cast(&DataType::String)?;
            string_cells(&cast, kind)?
        }
    };
    Ok(cells)
}

/// Converts a frame into raw records for `schema`.
///
/// Columns the schema does not declare are skipped. NaN becomes null, and a
/// null in an optional field that rejects nulls leaves the field out. Dates
/// and datetimes are rendered in the field's format, and text columns backing
/// container fields are parsed back into JSON.
pub fn frame_to_records(df: &DataFrame, schema: &Schema) -> Result<Vec<RawRecord>, SourceError> {
    let mut rows = vec![RawRecord::new(); df.height()];

    for series in df.get_columns() {
        let Some(field) = schema.field(series.name()) else {
            tracing::trace!(column = series.name(), "skipping undeclared frame column");
            continue;
        };
        let cells = column_cells(series, field.kind())?;
        for (row, cell) in rows.iter_mut().zip(cells) {
            // A null cell for a field that rejects nulls stands for an absent value.
            if cell.is_null() && !field.allows_none() && !field.is_required() {
                continue;
            }
            row.insert(field.name().to_string(), cell);
        }
    }
    Ok(rows)
}

/// Replaces date and datetime columns with text in each field's format.
///
/// Text formats such as CSV would otherwise write ISO layouts the schema may
/// not parse back.
pub fn format_temporal_columns(df: &DataFrame, schema: &Schema) -> PolarsResult<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(|series| {
            let field = schema.field(series.name());
            match (series.dtype(), field) {
                (DataType::Date | DataType::Datetime(..), Some(field)) => {
                    let cells: Vec<Option<String>> = column_cells(series, field.kind())?
                        .into_iter()
                        .map(|cell| cell.as_str().map(str::to_string))
                        .collect();
                    Ok(Series::new(series.name(), cells))
                }
                _ => Ok(series.clone()),
            }
        })
        .collect::<PolarsResult<Vec<_>>>()?;
    DataFrame::new(columns)
}

/// Replaces NaN with null in every float column. Float32 columns come back as Float64.
pub fn nan_to_null(df: &DataFrame) -> PolarsResult<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(|series| match series.dtype() {
            DataType::Float32 | DataType::Float64 => {
                let cast = series.cast(&DataType::Float64)?;
                let values: Vec<Option<f64>> = cast
                    .f64()?
                    .into_iter()
                    .map(|v| v.filter(|f| !f.is_nan()))
                    .collect();
                Ok(Series::new(series.name(), values))
            }
            _ => Ok(series.clone()),
        })
        .collect::<PolarsResult<Vec<_>>>()?;
    DataFrame::new(columns)
}
