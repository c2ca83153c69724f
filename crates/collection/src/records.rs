//! Helpers for reshaping record lists.

use crate::error::SourceError;
use core_types::{RawRecord, Value};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Native rows: field name to value, as produced by `Record::into_values`.
pub type Row = BTreeMap<String, Value>;

/// Transposes records into columns. A key missing from a record becomes `null`
/// in that record's slot.
pub fn records_to_columns(records: &[RawRecord]) -> BTreeMap<String, Vec<JsonValue>> {
    let mut columns: BTreeMap<String, Vec<JsonValue>> = BTreeMap::new();
    for record in records {
        for key in record.keys() {
            columns.entry(key.clone()).or_default();
        }
    }
    for (name, column) in columns.iter_mut() {
        column.extend(
            records
                .iter()
                .map(|r| r.get(name).cloned().unwrap_or(JsonValue::Null)),
        );
    }
    columns
}

/// Transposes columns back into records. Every column must have the same length.
pub fn columns_to_records(
    columns: &BTreeMap<String, Vec<JsonValue>>,
) -> Result<Vec<RawRecord>, SourceError> {
    let height = columns.values().next().map(Vec::len).unwrap_or(0);
    if let Some((name, column)) = columns.iter().find(|(_, c)| c.len() != height) {
        return Err(SourceError::RaggedColumns {
            column: name.clone(),
            expected: height,
            found: column.len(),
        });
    }

    Ok((0..height)
        .map(|i| {
            columns
                .iter()
                .map(|(name, column)| (name.clone(), column[i].clone()))
                .collect()
        })
        .collect())
}

/// Replaces NaN floats with `Value::Null`.
pub fn replace_nan_with_none(rows: &mut [Row]) {
    for value in rows.iter_mut().flat_map(|row| row.values_mut()) {
        if matches!(value, Value::Float(f) if f.is_nan()) {
            *value = Value::Null;
        }
    }
}

/// Renders date and datetime values of the named columns as strings, using the
/// strftime layout given for each column.
pub fn date_to_string(rows: &mut [Row], formats: &BTreeMap<String, String>) {
    for row in rows.iter_mut() {
        for (column, format) in formats {
            let Some(value) = row.get_mut(column) else {
                continue;
            };
            let text = match value {
                Value::Date(d) => d.format(format).to_string(),
                Value::DateTime(dt) => dt.format(format).to_string(),
                _ => continue,
            };
            *value = Value::Str(text);
        }
    }
}
