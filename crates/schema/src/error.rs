use core_types::CoreError;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Per-field messages for one record.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Validation messages for a batch, keyed by record index and then field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<usize, FieldErrors>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, index: usize, fields: FieldErrors) {
        if !fields.is_empty() {
            self.errors.insert(index, fields);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of records with at least one error.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn record(&self, index: usize) -> Option<&FieldErrors> {
        self.errors.get(&index)
    }

    pub fn messages(&self, index: usize, field: &str) -> &[String] {
        self.errors
            .get(&index)
            .and_then(|fields| fields.get(field))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&usize, &FieldErrors)> {
        self.errors.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (index, fields) in &self.errors {
            for (field, messages) in fields {
                if !first {
                    write!(f, "; ")?;
                }
                first = false;
                write!(f, "[{index}] {field}: {}", messages.join(" "))?;
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("{n} invalid record(s): {0}", n = .0.len())]
    Validation(ValidationErrors),

    #[error("Invalid schema declaration: {0}")]
    Declaration(String),

    #[error("Record construction failed: {0}")]
    Core(#[from] CoreError),
}
