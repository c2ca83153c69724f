use crate::collection::CollectionDef;
use crate::error::CollectionError;
use core_types::RecordKind;
use schema::Schema;
use std::collections::HashSet;
use std::sync::Arc;

/// Declares a collection over a schema.
///
/// `CollectionBuilder::new("Building")` produces a `BuildingCollection` whose
/// records are of kind `BuildingInternal`.
#[derive(Debug, Clone)]
pub struct CollectionBuilder {
    name: String,
    namespace: Option<String>,
    unique_fields: Vec<String>,
}

impl CollectionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            unique_fields: Vec::new(),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Fields whose combined values must be distinct across the collection.
    pub fn unique_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn collection_name(&self) -> String {
        format!("{}Collection", self.name)
    }

    pub fn internal_name(&self) -> String {
        format!("{}Internal", self.name)
    }

    /// Builds only the record kind, for callers that need native records
    /// without a collection around them.
    pub fn build_internal(&self, schema: &Schema) -> RecordKind {
        RecordKind::new(self.internal_name(), schema.field_names())
    }

    pub fn build(self, schema: impl Into<Arc<Schema>>) -> Result<Arc<CollectionDef>, CollectionError> {
        let schema = schema.into();
        if self.name.trim().is_empty() {
            return Err(CollectionError::Declaration(
                "collection name must not be empty".into(),
            ));
        }

        let mut seen = HashSet::new();
        for field in &self.unique_fields {
            if schema.field(field).is_none() {
                return Err(CollectionError::Declaration(format!(
                    "unique field '{}' is not declared by schema '{}'",
                    field,
                    schema.name()
                )));
            }
            if !seen.insert(field.as_str()) {
                return Err(CollectionError::Declaration(format!(
                    "unique field '{field}' listed twice"
                )));
            }
        }

        let kind = self.build_internal(&schema);
        let def = CollectionDef::new(
            self.collection_name(),
            self.namespace,
            schema,
            kind,
            self.unique_fields,
        );
        tracing::debug!(collection = %def.qualified_name(), "declared collection");
        Ok(Arc::new(def))
    }
}
