use crate::error::CoreError;
use crate::value::Value;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::sync::Arc;

/// A JSON object: the serialized form of one record.
pub type RawRecord = Map<String, JsonValue>;

/// Keyword settings and side-channel data handed to adapters and factories.
pub type Context = BTreeMap<String, JsonValue>;

/// A dynamically declared record shape.
///
/// Every collection owns one. It names the records the collection holds and
/// guards construction so that only declared fields can be set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKind {
    name: Arc<str>,
    fields: Vec<String>,
}

impl RecordKind {
    pub fn new(name: impl Into<String>, fields: Vec<String>) -> Self {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Builds a record of this kind, rejecting undeclared fields.
    pub fn make(&self, values: BTreeMap<String, Value>) -> Result<Record, CoreError> {
        if let Some(unknown) = values.keys().find(|k| !self.has_field(k)) {
            return Err(CoreError::UnknownField {
                field: unknown.clone(),
                kind: self.name.to_string(),
            });
        }
        Ok(Record {
            kind: Arc::clone(&self.name),
            values,
        })
    }
}

/// A validated record: the native, in-memory form of one collection row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: Arc<str>,
    values: BTreeMap<String, Value>,
}

impl Record {
    /// The name of the `RecordKind` that built this record.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.values.iter()
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn into_values(self) -> BTreeMap<String, Value> {
        self.values
    }

    /// Untyped JSON rendering. Collections dump through their schema instead,
    /// which applies field formats.
    pub fn to_json(&self) -> RawRecord {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
