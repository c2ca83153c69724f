use crate::error::{FieldErrors, SchemaError, ValidationErrors};
use crate::field::{Field, NULL_MESSAGE, REQUIRED_MESSAGE};
use core_types::{RawRecord, Record, RecordKind, Value};
use polars::prelude::DataType;
use std::collections::{BTreeMap, HashSet};

/// A named, ordered set of typed fields.
///
/// The schema validates raw JSON records into native `Record`s and dumps them
/// back. Field order is the column order of every frame built from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
}

/// Incrementally declares a `Schema`.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::Declaration("schema name must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name()) {
                return Err(SchemaError::Declaration(format!(
                    "field '{}' declared twice in schema '{}'",
                    field.name(),
                    self.name
                )));
            }
        }
        Ok(Schema {
            name: self.name,
            fields: self.fields,
        })
    }
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name().to_string()).collect()
    }

    /// The record kind used for records nested inside another schema.
    pub fn record_kind(&self) -> RecordKind {
        RecordKind::new(self.name.clone(), self.field_names())
    }

    /// Column names and frame dtypes in declaration order.
    pub fn frame_dtypes(&self) -> Vec<(String, DataType)> {
        self.fields
            .iter()
            .map(|f| (f.name().to_string(), f.kind().frame_dtype()))
            .collect()
    }

    /// Validates one raw record into field values. Unknown keys are ignored.
    pub(crate) fn validate(&self, raw: &RawRecord) -> Result<BTreeMap<String, Value>, FieldErrors> {
        let mut values = BTreeMap::new();
        let mut errors = FieldErrors::new();

        for field in &self.fields {
            match raw.get(field.name()) {
                None if field.is_required() => {
                    errors.insert(field.name().to_string(), vec![REQUIRED_MESSAGE.to_string()]);
                }
                None => {}
                Some(json) if json.is_null() => {
                    if field.allows_none() {
                        values.insert(field.name().to_string(), Value::Null);
                    } else {
                        errors.insert(field.name().to_string(), vec![NULL_MESSAGE.to_string()]);
                    }
                }
                Some(json) => match field.kind().deserialize(json) {
                    Ok(value) => {
                        values.insert(field.name().to_string(), value);
                    }
                    Err(messages) => {
                        errors.insert(field.name().to_string(), messages);
                    }
                },
            }
        }

        if errors.is_empty() {
            Ok(values)
        } else {
            Err(errors)
        }
    }

    /// Validates a single record.
    pub fn load(&self, raw: &RawRecord, kind: &RecordKind) -> Result<Record, SchemaError> {
        let mut records = self.load_many(std::slice::from_ref(raw), kind)?;
        Ok(records.remove(0))
    }

    /// Validates a batch. Every record is checked before any error is reported,
    /// and a single invalid record fails the whole batch.
    pub fn load_many(&self, raws: &[RawRecord], kind: &RecordKind) -> Result<Vec<Record>, SchemaError> {
        let mut errors = ValidationErrors::new();
        let mut valid = Vec::with_capacity(raws.len());

        for (index, raw) in raws.iter().enumerate() {
            match self.validate(raw) {
                Ok(values) => valid.push(values),
                Err(fields) => errors.insert(index, fields),
            }
        }

        if !errors.is_empty() {
            tracing::debug!(
                schema = %self.name,
                invalid = errors.len(),
                total = raws.len(),
                "schema validation failed"
            );
            return Err(SchemaError::Validation(errors));
        }

        valid
            .into_iter()
            .map(|values| kind.make(values).map_err(SchemaError::from))
            .collect()
    }

    /// Renders a record as JSON in field order. Absent fields are omitted.
    pub fn dump(&self, record: &Record) -> RawRecord {
        let mut out = RawRecord::new();
        for field in &self.fields {
            if let Some(value) = record.get(field.name()) {
                out.insert(field.name().to_string(), field.kind().render(value));
            }
        }
        out
    }

    pub fn dump_many(&self, records: &[Record]) -> Vec<RawRecord> {
        records.iter().map(|r| self.dump(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;
    use chrono::NaiveDate;
    use serde_json::{Value as JsonValue, json};

    fn raw(value: JsonValue) -> RawRecord {
        match value {
            JsonValue::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn building_schema() -> Schema {
        Schema::builder("Building")
            .field(Field::new("bdbid", FieldKind::Integer))
            .field(Field::new("name", FieldKind::Str))
            .build()
            .unwrap()
    }

    #[test]
    fn duplicate_fields_are_rejected() {
        let err = Schema::builder("Dup")
            .field(Field::new("a", FieldKind::Integer))
            .field(Field::new("a", FieldKind::Float))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::Declaration(_)));
    }

    #[test]
    fn loads_records_of_the_given_kind() {
        let schema = building_schema();
        let kind = RecordKind::new("BuildingInternal", schema.field_names());
        let records = schema
            .load_many(
                &[
                    raw(json!({"bdbid": 1, "name": "hi-there"})),
                    raw(json!({"bdbid": 2, "name": "hi-ho"})),
                ],
                &kind,
            )
            .unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.kind() == "BuildingInternal"));
        assert_eq!(records[1].get("name"), Some(&Value::from("hi-ho")));
    }

    #[test]
    fn collects_errors_per_record_and_field() {
        let schema = building_schema();
        let kind = schema.record_kind();
        let err = schema
            .load_many(
                &[
                    raw(json!({"bdbid": "hep", "name": "hi-there"})),
                    raw(json!({"bdbid": 2, "name": "hi-ho"})),
                    raw(json!({"bdbid": null, "name": 1})),
                ],
                &kind,
            )
            .unwrap_err();

        assert!(err.to_string().starts_with("2 invalid record(s): [0] bdbid: Not a valid integer."));
        let SchemaError::Validation(errors) = err else {
            panic!("expected a validation error");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.messages(0, "bdbid"), ["Not a valid integer."]);
        assert!(errors.record(1).is_none());
        assert_eq!(errors.messages(2, "bdbid"), ["Field may not be null."]);
        assert_eq!(errors.messages(2, "name"), ["Not a valid string."]);
    }

    #[test]
    fn required_and_nullable_fields() {
        let schema = Schema::builder("Reading")
            .field(Field::new("id", FieldKind::Integer).required())
            .field(Field::new("value", FieldKind::Float).allow_none())
            .build()
            .unwrap();
        let kind = schema.record_kind();

        let record = schema.load(&raw(json!({"id": 1, "value": null})), &kind).unwrap();
        assert_eq!(record.get("value"), Some(&Value::Null));

        let err = schema.load(&raw(json!({"value": 2.5})), &kind).unwrap_err();
        let SchemaError::Validation(errors) = err else {
            panic!("expected a validation error");
        };
        assert_eq!(errors.messages(0, "id"), ["Missing data for required field."]);
    }

    #[test]
    fn unknown_keys_are_ignored_and_missing_fields_omitted_on_dump() {
        let schema = building_schema();
        let kind = schema.record_kind();
        let record = schema
            .load(&raw(json!({"bdbid": 3, "extra": true})), &kind)
            .unwrap();

        assert!(!record.contains("extra"));
        assert_eq!(JsonValue::Object(schema.dump(&record)), json!({"bdbid": 3}));
    }

    #[test]
    fn nested_schemas_validate_recursively() {
        let meter = Schema::builder("Meter")
            .field(Field::new("serial", FieldKind::Str).required())
            .field(Field::new("installed", FieldKind::date()))
            .build()
            .unwrap();
        let site = Schema::builder("Site")
            .field(Field::new("meter", FieldKind::nested(meter)))
            .build()
            .unwrap();
        let kind = site.record_kind();

        let record = site
            .load(
                &raw(json!({"meter": {"serial": "m-1", "installed": "2018-01-25"}})),
                &kind,
            )
            .unwrap();
        let Some(Value::Record(inner)) = record.get("meter") else {
            panic!("expected a nested record");
        };
        assert_eq!(inner.kind(), "Meter");
        assert_eq!(
            inner.get("installed"),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2018, 1, 25).unwrap()))
        );
        assert_eq!(
            JsonValue::Object(site.dump(&record)),
            json!({"meter": {"serial": "m-1", "installed": "2018-01-25"}})
        );

        let err = site.load(&raw(json!({"meter": {}})), &kind).unwrap_err();
        let SchemaError::Validation(errors) = err else {
            panic!("expected a validation error");
        };
        assert_eq!(
            errors.messages(0, "meter"),
            ["serial: Missing data for required field."]
        );
    }

    #[test]
    fn frame_dtypes_follow_declaration_order() {
        let dtypes = building_schema().frame_dtypes();
        assert_eq!(
            dtypes,
            vec![
                ("bdbid".to_string(), DataType::Int64),
                ("name".to_string(), DataType::String),
            ]
        );
    }
}
