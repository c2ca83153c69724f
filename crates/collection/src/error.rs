use polars::prelude::PolarsError;
use schema::{SchemaError, ValidationErrors};
use thiserror::Error;

/// Problems turning an input (JSON, frame, objects) into raw records.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Expected a JSON array of records")]
    NotAnArray,

    #[error("Row {0} is not a JSON object")]
    NotAnObject(usize),

    #[error("Column '{column}' has {found} values, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Frame conversion failed: {0}")]
    Frame(#[from] PolarsError),

    #[error("JSON conversion failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("A validation error occurred while loading {collection}: {errors}")]
    Validation {
        collection: String,
        errors: ValidationErrors,
    },

    #[error("An error occurred while loading records into {collection}: {source}")]
    Load {
        collection: String,
        #[source]
        source: SourceError,
    },

    #[error("Record {index} violates the unique constraint on ({fields}) of {collection}")]
    UniqueViolation {
        collection: String,
        fields: String,
        index: usize,
    },

    #[error("Only collections of the same type can be combined: expected {expected}, found {found}")]
    Mismatch { expected: String, found: String },

    #[error("Invalid collection declaration: {0}")]
    Declaration(String),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Frame error: {0}")]
    Frame(#[from] PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
