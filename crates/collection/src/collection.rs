use crate::error::{CollectionError, SourceError};
use crate::frame::records_to_frame;
use crate::records::Row;
use crate::source::IntoRecords;
use core_types::{RawRecord, Record, RecordKind};
use polars::prelude::DataFrame;
use schema::{Schema, SchemaError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::ops::Index;
use std::sync::Arc;

/// The immutable definition shared by every instance of one collection type.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDef {
    name: String,
    namespace: Option<String>,
    schema: Arc<Schema>,
    kind: RecordKind,
    unique_fields: Vec<String>,
}

impl CollectionDef {
    pub(crate) fn new(
        name: String,
        namespace: Option<String>,
        schema: Arc<Schema>,
        kind: RecordKind,
        unique_fields: Vec<String>,
    ) -> Self {
        Self {
            name,
            namespace,
            schema,
            kind,
            unique_fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// `namespace.Name`, or just the name when no namespace is set.
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}.{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn kind(&self) -> &RecordKind {
        &self.kind
    }

    pub fn unique_fields(&self) -> &[String] {
        &self.unique_fields
    }
}

/// An in-memory, schema-validated list of records.
#[derive(Debug, Clone)]
pub struct Collection {
    def: Arc<CollectionDef>,
    records: Vec<Record>,
}

impl Collection {
    pub fn new(def: Arc<CollectionDef>) -> Self {
        Self {
            def,
            records: Vec::new(),
        }
    }

    pub fn def(&self) -> &Arc<CollectionDef> {
        &self.def
    }

    pub fn name(&self) -> &str {
        self.def.name()
    }

    pub fn schema(&self) -> &Schema {
        &self.def.schema
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Validates `source` and appends the records.
    ///
    /// Loads accumulate. If anything is wrong with the batch (malformed input,
    /// an invalid record, a duplicate unique key) nothing is appended.
    pub fn load_data<S: IntoRecords>(&mut self, source: S) -> Result<&mut Self, CollectionError> {
        let collection = self.def.qualified_name();
        let raws = source.into_records(&self.def.schema).map_err(|source| {
            tracing::error!(%collection, error = %source, "could not read records");
            CollectionError::Load {
                collection: collection.clone(),
                source,
            }
        })?;

        let records = match self.def.schema.load_many(&raws, &self.def.kind) {
            Ok(records) => records,
            Err(SchemaError::Validation(errors)) => {
                tracing::error!(%collection, %errors, "validation failed");
                return Err(CollectionError::Validation { collection, errors });
            }
            Err(other) => return Err(other.into()),
        };

        self.check_unique(&records)?;
        tracing::debug!(%collection, loaded = records.len(), total = self.records.len() + records.len(), "loaded records");
        self.records.extend(records);
        Ok(self)
    }

    /// The unique-field values of `record`, or `None` when any of them is
    /// absent or null. Such records take no part in the constraint.
    fn unique_key(&self, record: &Record) -> Option<Vec<String>> {
        self.def
            .unique_fields
            .iter()
            .map(|field| {
                record
                    .get(field)
                    .filter(|v| !v.is_null())
                    .map(|v| v.to_json().to_string())
            })
            .collect()
    }

    fn check_unique(&self, incoming: &[Record]) -> Result<(), CollectionError> {
        if self.def.unique_fields.is_empty() {
            return Ok(());
        }
        let mut seen: HashSet<Vec<String>> =
            self.records.iter().filter_map(|r| self.unique_key(r)).collect();
        for (index, record) in incoming.iter().enumerate() {
            let Some(key) = self.unique_key(record) else {
                continue;
            };
            if !seen.insert(key) {
                let collection = self.def.qualified_name();
                tracing::error!(%collection, index, "unique constraint violated");
                return Err(CollectionError::UniqueViolation {
                    collection,
                    fields: self.def.unique_fields.join(", "),
                    index,
                });
            }
        }
        Ok(())
    }

    pub fn load_json(&mut self, text: &str) -> Result<&mut Self, CollectionError> {
        let json: JsonValue = serde_json::from_str(text).map_err(|e| CollectionError::Load {
            collection: self.def.qualified_name(),
            source: SourceError::Json(e),
        })?;
        self.load_data(json)
    }

    /// Loads native objects by serializing each one to a JSON record first.
    pub fn load_objects<T: Serialize>(&mut self, objects: &[T]) -> Result<&mut Self, CollectionError> {
        let rows = objects
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CollectionError::Load {
                collection: self.def.qualified_name(),
                source: SourceError::Json(e),
            })?;
        self.load_data(rows)
    }

    /// The records dumped through the schema.
    pub fn data(&self) -> Vec<RawRecord> {
        self.def.schema.dump_many(&self.records)
    }

    pub fn to_json(&self) -> Result<String, CollectionError> {
        Ok(serde_json::to_string(&self.data())?)
    }

    pub fn to_objects<T: DeserializeOwned>(&self) -> Result<Vec<T>, CollectionError> {
        self.data()
            .into_iter()
            .map(|record| serde_json::from_value(JsonValue::Object(record)).map_err(CollectionError::from))
            .collect()
    }

    /// One column per schema field, in declaration order.
    pub fn to_dataframe(&self) -> Result<DataFrame, CollectionError> {
        Ok(records_to_frame(&self.def.schema, &self.records)?)
    }

    /// Native field values of every record.
    pub fn to_rows(&self) -> Vec<Row> {
        self.records.iter().map(|r| r.values().clone()).collect()
    }

    /// Combines two collections of the same definition into a new one.
    ///
    /// The records are reloaded, so unique constraints hold across both sets.
    pub fn concat(&self, other: &Collection) -> Result<Collection, CollectionError> {
        if *self.def != *other.def {
            return Err(CollectionError::Mismatch {
                expected: self.def.qualified_name(),
                found: other.def.qualified_name(),
            });
        }
        let mut combined = Collection::new(Arc::clone(&self.def));
        combined.load_data(self.data())?;
        combined.load_data(other.data())?;
        Ok(combined)
    }
}

impl Index<usize> for Collection {
    type Output = Record;

    fn index(&self, index: usize) -> &Record {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CollectionBuilder;
    use chrono::NaiveDate;
    use core_types::Value;
    use polars::prelude::*;
    use schema::{Field, FieldKind};
    use serde::Deserialize;
    use serde_json::json;

    fn building_def() -> Arc<CollectionDef> {
        let schema = Schema::builder("Building")
            .field(Field::new("bdbid", FieldKind::Integer))
            .field(Field::new("name", FieldKind::Str))
            .build()
            .unwrap();
        CollectionBuilder::new("Building").build(schema).unwrap()
    }

    fn reading_def() -> Arc<CollectionDef> {
        let schema = Schema::builder("Reading")
            .field(Field::new("id", FieldKind::Integer).required())
            .field(Field::new("taken", FieldKind::Date { format: "%m/%d/%Y".into() }))
            .field(Field::new("value", FieldKind::Float).allow_none())
            .build()
            .unwrap();
        CollectionBuilder::new("Reading")
            .unique_fields(["id"])
            .build(schema)
            .unwrap()
    }

    #[test]
    fn loads_json_rows_into_native_records() {
        let mut c = Collection::new(building_def());
        c.load_data(json!([
            {"bdbid": 1, "name": "hi-there"},
            {"bdbid": 2, "name": "hi-ho"},
            {"bdbid": 3, "name": "whoop-dee-do"},
        ]))
        .unwrap();

        assert_eq!(c.len(), 3);
        assert_eq!(c[0].kind(), "BuildingInternal");
        assert_eq!(c[2].get("name"), Some(&Value::from("whoop-dee-do")));
        assert_eq!(c.iter().count(), 3);
    }

    #[test]
    fn loads_accumulate() {
        let mut c = Collection::new(building_def());
        c.load_json(r#"[{"bdbid": 1, "name": "a"}]"#).unwrap();
        c.load_json(r#"[{"bdbid": 2, "name": "b"}]"#).unwrap();
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn failed_load_leaves_collection_unchanged() {
        let mut c = Collection::new(building_def());
        c.load_data(json!([{"bdbid": 1, "name": "a"}])).unwrap();

        let err = c
            .load_data(json!([
                {"bdbid": 2, "name": "b"},
                {"bdbid": "hep", "name": "c"},
            ]))
            .unwrap_err();
        let CollectionError::Validation { collection, errors } = err else {
            panic!("expected a validation error");
        };
        assert_eq!(collection, "BuildingCollection");
        assert_eq!(errors.messages(1, "bdbid"), ["Not a valid integer."]);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn malformed_input_is_a_load_error() {
        let mut c = Collection::new(building_def());
        let err = c.load_data(json!([{"bdbid": 1}, 5])).unwrap_err();
        assert!(matches!(
            err,
            CollectionError::Load {
                source: SourceError::NotAnObject(1),
                ..
            }
        ));

        let err = c.load_json("{not json").unwrap_err();
        assert!(matches!(err, CollectionError::Load { .. }));
        assert!(c.is_empty());
    }

    #[test]
    fn unique_fields_are_enforced() {
        let mut c = Collection::new(reading_def());
        c.load_data(json!([{"id": 1}, {"id": 2}])).unwrap();

        let err = c.load_data(json!([{"id": 3}, {"id": 1}])).unwrap_err();
        assert!(matches!(err, CollectionError::UniqueViolation { index: 1, .. }));

        let err = c.load_data(json!([{"id": 4}, {"id": 4}])).unwrap_err();
        assert!(matches!(err, CollectionError::UniqueViolation { index: 1, .. }));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn data_dumps_in_field_formats() {
        let mut c = Collection::new(reading_def());
        assert!(c.data().is_empty());

        c.load_data(json!([{"id": 1, "taken": "01/25/2018", "value": null}]))
            .unwrap();
        assert_eq!(
            c.get(0).and_then(|r| r.get("taken")),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2018, 1, 25).unwrap()))
        );
        assert_eq!(
            JsonValue::Object(c.data().remove(0)),
            json!({"id": 1, "taken": "01/25/2018", "value": null})
        );
        assert_eq!(
            c.to_json().unwrap(),
            r#"[{"id":1,"taken":"01/25/2018","value":null}]"#
        );
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Building {
        bdbid: i64,
        name: String,
    }

    #[test]
    fn native_objects_round_trip() {
        let buildings = vec![
            Building { bdbid: 1, name: "hi-there".into() },
            Building { bdbid: 2, name: "hi-ho".into() },
        ];
        let mut c = Collection::new(building_def());
        c.load_objects(&buildings).unwrap();

        let back: Vec<Building> = c.to_objects().unwrap();
        assert_eq!(back, buildings);
    }

    #[test]
    fn dataframe_follows_the_schema() {
        let mut c = Collection::new(reading_def());
        let empty = c.to_dataframe().unwrap();
        assert_eq!(empty.height(), 0);
        assert_eq!(empty.get_column_names(), ["id", "taken", "value"]);

        c.load_data(json!([
            {"id": 1, "taken": "01/25/2018", "value": 2.5},
            {"id": 2, "value": null},
        ]))
        .unwrap();
        let df = c.to_dataframe().unwrap();
        assert_eq!(df.get_column_names(), ["id", "taken", "value"]);
        assert_eq!(
            df.dtypes(),
            vec![DataType::Int64, DataType::Date, DataType::Float64]
        );
        assert_eq!(df.column("taken").unwrap().null_count(), 1);
        assert_eq!(df.column("value").unwrap().null_count(), 1);
    }

    #[test]
    fn dataframe_loads_back() {
        let mut c = Collection::new(reading_def());
        c.load_data(json!([
            {"id": 1, "taken": "01/25/2018", "value": 2.5},
            {"id": 2, "taken": "02/01/2018", "value": null},
        ]))
        .unwrap();
        let df = c.to_dataframe().unwrap();

        let mut reloaded = Collection::new(reading_def());
        reloaded.load_data(&df).unwrap();
        assert_eq!(reloaded.data(), c.data());
    }

    #[test]
    fn absent_optional_fields_survive_a_dataframe() {
        let mut c = Collection::new(reading_def());
        c.load_data(json!([
            {"id": 1, "taken": "01/25/2018", "value": null},
            {"id": 2, "value": 3.5},
        ]))
        .unwrap();
        let df = c.to_dataframe().unwrap();

        let mut reloaded = Collection::new(reading_def());
        reloaded.load_data(&df).unwrap();
        assert_eq!(reloaded.data(), c.data());
        assert!(!reloaded[1].contains("taken"));
        assert_eq!(reloaded[0].get("value"), Some(&Value::Null));
    }

    #[test]
    fn absent_unique_values_do_not_collide() {
        let schema = Schema::builder("Meter")
            .field(Field::new("serial", FieldKind::Str))
            .field(Field::new("label", FieldKind::Str).allow_none())
            .build()
            .unwrap();
        let def = CollectionBuilder::new("Meter")
            .unique_fields(["serial"])
            .build(schema)
            .unwrap();
        let mut c = Collection::new(def);
        c.load_data(json!([
            {"label": "a"},
            {"label": "b"},
            {"serial": "m-1"},
        ]))
        .unwrap();
        assert_eq!(c.len(), 3);

        let err = c.load_data(json!([{"serial": "m-1"}])).unwrap_err();
        assert!(matches!(err, CollectionError::UniqueViolation { index: 0, .. }));
    }

    #[test]
    fn concat_requires_the_same_definition() {
        let def = building_def();
        let mut left = Collection::new(Arc::clone(&def));
        left.load_data(json!([{"bdbid": 1, "name": "a"}])).unwrap();
        let mut right = Collection::new(def);
        right.load_data(json!([{"bdbid": 2, "name": "b"}])).unwrap();

        let both = left.concat(&right).unwrap();
        assert_eq!(both.len(), 2);
        assert_eq!(left.len(), 1);

        let other = Collection::new(reading_def());
        assert!(matches!(
            left.concat(&other),
            Err(CollectionError::Mismatch { .. })
        ));
    }

    #[test]
    fn concat_applies_unique_constraints() {
        let def = reading_def();
        let mut left = Collection::new(Arc::clone(&def));
        left.load_data(json!([{"id": 1}])).unwrap();
        let mut right = Collection::new(def);
        right.load_data(json!([{"id": 1}])).unwrap();

        assert!(matches!(
            left.concat(&right),
            Err(CollectionError::UniqueViolation { .. })
        ));
    }

    #[test]
    fn rows_expose_native_values() {
        let mut c = Collection::new(building_def());
        c.load_data(json!([{"bdbid": 7, "name": "x"}])).unwrap();
        let rows = c.to_rows();
        assert_eq!(rows[0]["bdbid"], Value::Int(7));
    }
}
