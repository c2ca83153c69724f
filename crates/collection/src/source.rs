use crate::error::SourceError;
use crate::frame::frame_to_records;
use core_types::RawRecord;
use polars::prelude::DataFrame;
use schema::Schema;
use serde_json::Value as JsonValue;

/// Anything a collection can load records from.
///
/// The target schema is passed along so that frame columns can be rendered in
/// the layouts the schema parses back (date formats, JSON-text containers).
pub trait IntoRecords {
    fn into_records(self, schema: &Schema) -> Result<Vec<RawRecord>, SourceError>;
}

impl IntoRecords for Vec<RawRecord> {
    fn into_records(self, _schema: &Schema) -> Result<Vec<RawRecord>, SourceError> {
        Ok(self)
    }
}

impl IntoRecords for &[RawRecord] {
    fn into_records(self, _schema: &Schema) -> Result<Vec<RawRecord>, SourceError> {
        Ok(self.to_vec())
    }
}

impl IntoRecords for Vec<JsonValue> {
    fn into_records(self, _schema: &Schema) -> Result<Vec<RawRecord>, SourceError> {
        self.into_iter()
            .enumerate()
            .map(|(i, row)| match row {
                JsonValue::Object(map) => Ok(map),
                _ => Err(SourceError::NotAnObject(i)),
            })
            .collect()
    }
}

impl IntoRecords for JsonValue {
    fn into_records(self, schema: &Schema) -> Result<Vec<RawRecord>, SourceError> {
        match self {
            JsonValue::Array(rows) => rows.into_records(schema),
            _ => Err(SourceError::NotAnArray),
        }
    }
}

impl IntoRecords for &DataFrame {
    fn into_records(self, schema: &Schema) -> Result<Vec<RawRecord>, SourceError> {
        frame_to_records(self, schema)
    }
}

impl IntoRecords for DataFrame {
    fn into_records(self, schema: &Schema) -> Result<Vec<RawRecord>, SourceError> {
        frame_to_records(&self, schema)
    }
}
